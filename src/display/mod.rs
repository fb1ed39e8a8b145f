/*
 *  display/mod.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem: bus transport, ST7735S panel protocol, framebuffer
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod error;
pub mod framebuffer;

// Wire layer
pub mod transport;
pub mod recorder;

// Controller protocol
pub mod panel;

// Re-exports for convenience
pub use error::{DisplayError, TransportError};
pub use framebuffer::{Framebuffer, BYTES_PER_PIXEL};
pub use panel::{St7735s, Window, ST7735S_INIT};
pub use recorder::{BusEvent, RecordingTransport};
pub use transport::{BusTransport, SpiTransport, UnavailableTransport};

#[cfg(target_os = "linux")]
pub use transport::LinuxTransport;
