/*
 *  display/panel.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  ST7735S TFT controller: power-on sequence, address window, pixel push
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

use log::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::framebuffer::{Framebuffer, BYTES_PER_PIXEL};
use crate::display::transport::BusTransport;

/// ST7735S command bytes
pub mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPIN: u8 = 0x10;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;    // Column address set
    pub const RASET: u8 = 0x2B;    // Row address set
    pub const RAMWR: u8 = 0x2C;    // Memory write
    pub const MADCTL: u8 = 0x36;   // Memory access control
    pub const COLMOD: u8 = 0x3A;   // Pixel format
    pub const FRMCTR1: u8 = 0xB1;
    pub const FRMCTR2: u8 = 0xB2;
    pub const FRMCTR3: u8 = 0xB3;
    pub const INVCTR: u8 = 0xB4;
    pub const PWCTR1: u8 = 0xC0;
    pub const PWCTR2: u8 = 0xC1;
    pub const PWCTR3: u8 = 0xC2;
    pub const PWCTR4: u8 = 0xC3;
    pub const PWCTR5: u8 = 0xC4;
    pub const VMCTR1: u8 = 0xC5;
    pub const GMCTRP1: u8 = 0xE0;
    pub const GMCTRN1: u8 = 0xE1;
}

/// One entry of the power-on sequence: command, parameters, settle time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStep {
    pub command: u8,
    pub args: &'static [u8],
    pub delay_ms: u32,
}

const fn step(command: u8, args: &'static [u8], delay_ms: u32) -> InitStep {
    InitStep { command, args, delay_ms }
}

/// Power-on sequence for the 128x160 ST7735S module, 16-bit RGB565,
/// BGR panel order, no hardware rotation.
pub const ST7735S_INIT: &[InitStep] = &[
    step(cmd::SWRESET, &[], 150),
    step(cmd::SLPOUT, &[], 500),
    step(cmd::FRMCTR1, &[0x01, 0x2C, 0x2D], 0),
    step(cmd::FRMCTR2, &[0x01, 0x2C, 0x2D], 0),
    step(cmd::FRMCTR3, &[0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D], 0),
    step(cmd::INVCTR, &[0x07], 0),
    step(cmd::PWCTR1, &[0xA2, 0x02, 0x84], 0),
    step(cmd::PWCTR2, &[0xC5], 0),
    step(cmd::PWCTR3, &[0x0A, 0x00], 0),
    step(cmd::PWCTR4, &[0x8A, 0x2A], 0),
    step(cmd::PWCTR5, &[0x8A, 0xEE], 0),
    step(cmd::VMCTR1, &[0x0E], 0),
    step(cmd::INVOFF, &[], 0),
    step(cmd::MADCTL, &[0xC8], 0),
    step(cmd::COLMOD, &[0x05], 10),
    step(
        cmd::GMCTRP1,
        &[0x02, 0x1C, 0x07, 0x12, 0x37, 0x32, 0x29, 0x2D, 0x29, 0x25, 0x2B, 0x39, 0x00, 0x01, 0x03, 0x10],
        0,
    ),
    step(
        cmd::GMCTRN1,
        &[0x03, 0x1D, 0x07, 0x06, 0x2E, 0x2C, 0x29, 0x2D, 0x2E, 0x2E, 0x37, 0x3F, 0x00, 0x00, 0x02, 0x10],
        0,
    ),
    step(cmd::NORON, &[], 10),
    step(cmd::DISPON, &[], 100),
];

/// Inclusive panel rectangle the next pixel stream fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Window {
    pub fn area(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize * (self.y1 - self.y0 + 1) as usize
    }
}

/// ST7735S protocol on top of a bus transport.
///
/// The controller keeps an internal write cursor; a failed stream leaves it
/// somewhere unknown, so the cached window is forgotten on any push error
/// and the next flush programs it again.
pub struct St7735s<T> {
    transport: T,
    width: u16,
    height: u16,
    window: Option<Window>,
    initialized: bool,
}

impl<T: BusTransport> St7735s<T> {
    pub fn new(transport: T, config: &DisplayConfig) -> Self {
        Self {
            transport,
            // DisplayConfig guarantees both fit in 16 bits
            width: config.width() as u16,
            height: config.height() as u16,
            window: None,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Currently programmed address window, if known
    pub fn window(&self) -> Option<Window> {
        self.window
    }

    /// Hardware reset, power-on sequence, backlight on
    pub fn initialize(&mut self) -> Result<(), DisplayError> {
        info!("Initializing ST7735S ({}x{})", self.width, self.height);
        self.window = None;
        self.initialized = false;

        self.transport.reset()?;
        for entry in ST7735S_INIT {
            self.transport.write_command(entry.command)?;
            if !entry.args.is_empty() {
                self.transport.write_data(entry.args)?;
            }
            self.transport.delay_ms(entry.delay_ms);
        }
        self.transport.set_backlight(true)?;

        self.initialized = true;
        info!("ST7735S initialized successfully");
        Ok(())
    }

    /// Program the inclusive drawing rectangle (CASET + RASET)
    pub fn set_address_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        if x0 > x1 || y0 > y1 || x1 >= self.width || y1 >= self.height {
            return Err(DisplayError::InvalidWindow { x0, y0, x1, y1 });
        }

        self.window = None;
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();

        self.transport.write_command(cmd::CASET)?;
        self.transport.write_data(&[x0h, x0l, x1h, x1l])?;
        self.transport.write_command(cmd::RASET)?;
        self.transport.write_data(&[y0h, y0l, y1h, y1l])?;

        self.window = Some(Window { x0, y0, x1, y1 });
        Ok(())
    }

    /// Stream raw RGB565 bytes into the current window (RAMWR)
    pub fn push_pixels(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        let window = self.window.ok_or(DisplayError::WindowNotSet)?;
        let expected = window.area() * BYTES_PER_PIXEL;
        if bytes.len() != expected {
            return Err(DisplayError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let pushed = self
            .transport
            .write_command(cmd::RAMWR)
            .and_then(|_| self.transport.write_data(bytes));
        if let Err(err) = pushed {
            warn!("Pixel push aborted, address window invalidated: {}", err);
            self.window = None;
            return Err(err.into());
        }
        Ok(())
    }

    /// Push a whole framebuffer, programming the full-panel window if needed
    pub fn flush(&mut self, framebuffer: &Framebuffer) -> Result<(), DisplayError> {
        let full = Window {
            x0: 0,
            y0: 0,
            x1: self.width - 1,
            y1: self.height - 1,
        };
        if self.window != Some(full) {
            self.set_address_window(full.x0, full.y0, full.x1, full.y1)?;
        }
        debug!("Flushing {} pixels", full.area());
        self.push_pixels(&framebuffer.as_bytes())
    }

    /// Display off and sleep in; needs `initialize` to come back
    pub fn sleep(&mut self) -> Result<(), DisplayError> {
        self.window = None;
        self.initialized = false;
        self.transport.set_backlight(false)?;
        self.transport.write_command(cmd::DISPOFF)?;
        self.transport.delay_ms(10);
        self.transport.write_command(cmd::SLPIN)?;
        self.transport.delay_ms(120);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rotation;
    use crate::display::recorder::{BusEvent, RecordingTransport};

    fn panel(width: u32, height: u32) -> (St7735s<RecordingTransport>, RecordingTransport) {
        let config = DisplayConfig::with_geometry(width, height, Rotation::Deg0).unwrap();
        let transport = RecordingTransport::new();
        (St7735s::new(transport.clone(), &config), transport)
    }

    #[test]
    fn test_init_sequence_order() {
        let (mut panel, bus) = panel(128, 160);
        panel.initialize().unwrap();
        assert!(panel.is_initialized());

        let events = bus.events();
        assert_eq!(events[0], BusEvent::Reset);
        assert_eq!(events[1], BusEvent::Command(cmd::SWRESET));
        assert_eq!(events[2], BusEvent::Delay(150));

        let commands: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                BusEvent::Command(c) => Some(*c),
                _ => None,
            })
            .collect();
        let expected: Vec<u8> = ST7735S_INIT.iter().map(|s| s.command).collect();
        assert_eq!(commands, expected);

        assert!(events.contains(&BusEvent::Data(vec![0x05])));
        assert_eq!(events.last(), Some(&BusEvent::Backlight(true)));
    }

    #[test]
    fn test_every_step_has_a_delay() {
        let (mut panel, bus) = panel(128, 160);
        panel.initialize().unwrap();
        let delays = bus
            .events()
            .iter()
            .filter(|e| matches!(e, BusEvent::Delay(_)))
            .count();
        assert_eq!(delays, ST7735S_INIT.len());
    }

    #[test]
    fn test_init_reset_failure() {
        let (mut panel, bus) = panel(128, 160);
        bus.fail_reset(true);
        assert!(matches!(panel.initialize(), Err(DisplayError::Transport(_))));
        assert!(!panel.is_initialized());
    }

    #[test]
    fn test_address_window_bytes() {
        let (mut panel, bus) = panel(128, 160);
        panel.set_address_window(2, 3, 127, 159).unwrap();
        assert_eq!(
            bus.events(),
            vec![
                BusEvent::Command(cmd::CASET),
                BusEvent::Data(vec![0, 2, 0, 127]),
                BusEvent::Command(cmd::RASET),
                BusEvent::Data(vec![0, 3, 0, 159]),
            ]
        );
        assert_eq!(panel.window().unwrap().area(), 126 * 157);
    }

    #[test]
    fn test_window_validation() {
        let (mut panel, bus) = panel(128, 160);
        assert!(panel.set_address_window(0, 0, 128, 10).is_err());
        assert!(panel.set_address_window(10, 0, 5, 10).is_err());
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_push_requires_window() {
        let (mut panel, _bus) = panel(4, 4);
        assert_eq!(panel.push_pixels(&[0; 32]), Err(DisplayError::WindowNotSet));
    }

    #[test]
    fn test_push_length_must_match() {
        let (mut panel, _bus) = panel(4, 4);
        panel.set_address_window(0, 0, 1, 1).unwrap();
        assert_eq!(
            panel.push_pixels(&[0; 7]),
            Err(DisplayError::BufferSizeMismatch { expected: 8, actual: 7 })
        );
        assert!(panel.push_pixels(&[0; 8]).is_ok());
    }

    #[test]
    fn test_flush_reuses_window() {
        let config = DisplayConfig::with_geometry(4, 2, Rotation::Deg0).unwrap();
        let bus = RecordingTransport::new();
        let mut panel = St7735s::new(bus.clone(), &config);
        let fb = Framebuffer::new(&config);

        panel.flush(&fb).unwrap();
        panel.flush(&fb).unwrap();

        let casets = bus
            .events()
            .iter()
            .filter(|e| **e == BusEvent::Command(cmd::CASET))
            .count();
        assert_eq!(casets, 1);
        assert_eq!(bus.pixel_streams(), vec![vec![0; 16], vec![0; 16]]);
    }

    #[test]
    fn test_failed_push_forgets_window() {
        let config = DisplayConfig::with_geometry(4, 2, Rotation::Deg0).unwrap();
        let bus = RecordingTransport::new();
        let mut panel = St7735s::new(bus.clone(), &config);
        let fb = Framebuffer::new(&config);

        panel.flush(&fb).unwrap();
        bus.fail_after(1);
        assert!(panel.flush(&fb).is_err());
        assert_eq!(panel.window(), None);

        bus.heal();
        bus.clear_events();
        panel.flush(&fb).unwrap();
        assert_eq!(bus.events()[0], BusEvent::Command(cmd::CASET));
    }

    #[test]
    fn test_sleep_turns_backlight_off() {
        let (mut panel, bus) = panel(4, 4);
        panel.initialize().unwrap();
        bus.clear_events();
        panel.sleep().unwrap();
        assert_eq!(bus.events()[0], BusEvent::Backlight(false));
        assert!(bus.events().contains(&BusEvent::Command(cmd::SLPIN)));
        assert!(!panel.is_initialized());
    }
}
