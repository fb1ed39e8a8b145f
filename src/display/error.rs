/*
 *  display/error.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the display subsystem
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

use std::fmt;
use std::error::Error;

/// Failure talking to the panel over the serial bus or its control lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// SPI transfer failed
    Spi(String),

    /// GPIO line could not be claimed or driven
    Gpio(String),

    /// Bus device could not be opened or configured
    Unavailable(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Spi(msg) =>
                write!(f, "SPI communication error: {}", msg),
            TransportError::Gpio(msg) =>
                write!(f, "GPIO error: {}", msg),
            TransportError::Unavailable(msg) =>
                write!(f, "Bus unavailable: {}", msg),
        }
    }
}

impl Error for TransportError {}

/// Unified error type for all display operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// Bus transport failed; the panel state is indeterminate until the
    /// next address window is programmed
    Transport(TransportError),

    /// Invalid rotation angle
    InvalidRotation(u16),

    /// Pixel write outside the drawable canvas
    OutOfBounds { x: u32, y: u32 },

    /// Pixel push attempted before an address window was programmed
    WindowNotSet,

    /// Address window inverted or outside the panel
    InvalidWindow { x0: u16, y0: u16, x1: u16, y1: u16 },

    /// Pixel stream length does not match the address window
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Transport(err) =>
                write!(f, "Transport error: {}", err),
            DisplayError::InvalidRotation(degrees) =>
                write!(f, "Invalid rotation angle: {} (must be 0, 90, 180, or 270)", degrees),
            DisplayError::OutOfBounds { x, y } =>
                write!(f, "Pixel ({}, {}) is outside the display", x, y),
            DisplayError::WindowNotSet =>
                write!(f, "Address window must be set before pushing pixels"),
            DisplayError::InvalidWindow { x0, y0, x1, y1 } =>
                write!(f, "Invalid address window ({}, {})-({}, {})", x0, y0, x1, y1),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Buffer size mismatch: expected {} bytes, got {}", expected, actual),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for DisplayError {
    fn from(err: TransportError) -> Self {
        DisplayError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_source() {
        let err = DisplayError::from(TransportError::Spi("bus stalled".to_string()));
        assert_eq!(err.to_string(), "Transport error: SPI communication error: bus stalled");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_every_variant_has_message() {
        let all = [
            DisplayError::Transport(TransportError::Gpio("dc".to_string())),
            DisplayError::InvalidRotation(45),
            DisplayError::OutOfBounds { x: 1, y: 2 },
            DisplayError::WindowNotSet,
            DisplayError::InvalidWindow { x0: 4, y0: 0, x1: 2, y1: 0 },
            DisplayError::BufferSizeMismatch { expected: 8, actual: 7 },
        ];
        for err in all {
            // a new variant must be added above and to the match below
            match &err {
                DisplayError::Transport(_)
                | DisplayError::InvalidRotation(_)
                | DisplayError::OutOfBounds { .. }
                | DisplayError::WindowNotSet
                | DisplayError::InvalidWindow { .. }
                | DisplayError::BufferSizeMismatch { .. } => assert!(!err.to_string().is_empty()),
            }
        }
    }

    #[test]
    fn test_rotation_message() {
        let err = DisplayError::InvalidRotation(45);
        assert!(err.to_string().contains("must be 0, 90, 180, or 270"));
        assert!(err.source().is_none());
    }
}
