/*
 *  display/transport.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Byte-level bus transport: register/data writes and control lines
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

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::display::error::TransportError;

/// Largest single SPI transfer; matches the default spidev `bufsiz`
pub const MAX_TRANSFER: usize = 4096;

/// Minimal hardware abstraction between the panel protocol and the wire.
///
/// Every write either completes or reports a `TransportError`; an
/// implementation never drops bytes silently.
pub trait BusTransport: Send {
    /// Pulse the reset line with the panel's settle delays
    fn reset(&mut self) -> Result<(), TransportError>;

    /// Send one command byte with D/C low
    fn write_command(&mut self, command: u8) -> Result<(), TransportError>;

    /// Send one or more parameter/pixel bytes with D/C high
    fn write_data(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Block for the given number of milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Drive the backlight line, if the panel has one wired
    fn set_backlight(&mut self, _on: bool) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }

    fn write_command(&mut self, command: u8) -> Result<(), TransportError> {
        (**self).write_command(command)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_data(data)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), TransportError> {
        (**self).set_backlight(on)
    }
}

/// 4-wire SPI transport: SPI device plus D/C, reset and optional backlight
/// GPIO lines.
///
/// Chip-select belongs to the `SpiDevice`, which asserts it for the length
/// of each transfer and releases it afterwards.
pub struct SpiTransport<SPI, P, D> {
    spi: SPI,
    dc: P,
    rst: P,
    backlight: Option<P>,
    delay: D,
}

impl<SPI, P, D> SpiTransport<SPI, P, D>
where
    SPI: SpiDevice,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, dc: P, rst: P, backlight: Option<P>, delay: D) -> Self {
        Self { spi, dc, rst, backlight, delay }
    }
}

fn gpio_err<E: core::fmt::Debug>(line: &str, err: E) -> TransportError {
    TransportError::Gpio(format!("{} line: {:?}", line, err))
}

fn spi_err<E: core::fmt::Debug>(err: E) -> TransportError {
    TransportError::Spi(format!("{:?}", err))
}

impl<SPI, P, D> BusTransport for SpiTransport<SPI, P, D>
where
    SPI: SpiDevice + Send,
    P: OutputPin + Send,
    D: DelayNs + Send,
{
    fn reset(&mut self) -> Result<(), TransportError> {
        self.rst.set_high().map_err(|e| gpio_err("reset", e))?;
        self.delay.delay_ms(5);
        self.rst.set_low().map_err(|e| gpio_err("reset", e))?;
        self.delay.delay_ms(10);
        self.rst.set_high().map_err(|e| gpio_err("reset", e))?;
        // controller ignores commands for up to 120ms after reset release
        self.delay.delay_ms(120);
        Ok(())
    }

    fn write_command(&mut self, command: u8) -> Result<(), TransportError> {
        self.dc.set_low().map_err(|e| gpio_err("data/command", e))?;
        self.spi.write(&[command]).map_err(spi_err)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.dc.set_high().map_err(|e| gpio_err("data/command", e))?;
        for chunk in data.chunks(MAX_TRANSFER) {
            self.spi.write(chunk).map_err(spi_err)?;
        }
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), TransportError> {
        match self.backlight.as_mut() {
            Some(pin) if on => pin.set_high().map_err(|e| gpio_err("backlight", e)),
            Some(pin) => pin.set_low().map_err(|e| gpio_err("backlight", e)),
            None => Ok(()),
        }
    }
}

/// Stand-in for a bus that could not be opened at startup; every operation
/// reports the original failure so initialization fails cleanly.
#[derive(Debug, Clone)]
pub struct UnavailableTransport {
    reason: TransportError,
}

impl UnavailableTransport {
    pub fn new(reason: TransportError) -> Self {
        Self { reason }
    }
}

impl BusTransport for UnavailableTransport {
    fn reset(&mut self) -> Result<(), TransportError> {
        Err(self.reason.clone())
    }

    fn write_command(&mut self, _command: u8) -> Result<(), TransportError> {
        Err(self.reason.clone())
    }

    fn write_data(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        Err(self.reason.clone())
    }

    fn delay_ms(&mut self, _ms: u32) {}
}

#[cfg(target_os = "linux")]
mod linux {
    use linux_embedded_hal::{
        gpio_cdev::{Chip, LineRequestFlags},
        spidev::{SpiModeFlags, SpidevOptions},
        CdevPin, Delay, SpidevDevice,
    };
    use log::info;

    use super::SpiTransport;
    use crate::config::DisplayConfig;
    use crate::display::error::TransportError;

    pub type LinuxTransport = SpiTransport<SpidevDevice, CdevPin, Delay>;

    fn request_output(chip: &mut Chip, pin: u32, initial: u8, consumer: &str) -> Result<CdevPin, TransportError> {
        let line = chip
            .get_line(pin)
            .map_err(|e| TransportError::Gpio(format!("getting line {}: {}", pin, e)))?;
        let handle = line
            .request(LineRequestFlags::OUTPUT, initial, consumer)
            .map_err(|e| TransportError::Gpio(format!("requesting line {}: {}", pin, e)))?;
        CdevPin::new(handle)
            .map_err(|e| TransportError::Gpio(format!("creating pin {}: {}", pin, e)))
    }

    impl LinuxTransport {
        /// Claim the spidev node and GPIO lines named by the configuration
        pub fn open_linux(config: &DisplayConfig) -> Result<Self, TransportError> {
            let path = config.spi_device_path();
            let mut spi = SpidevDevice::open(&path)
                .map_err(|e| TransportError::Unavailable(format!("opening {}: {}", path, e)))?;
            let options = SpidevOptions::new()
                .bits_per_word(8)
                .max_speed_hz(config.spi_speed_hz())
                .mode(SpiModeFlags::SPI_MODE_0)
                .build();
            spi.configure(&options)
                .map_err(|e| TransportError::Unavailable(format!("configuring {}: {}", path, e)))?;

            let mut chip = Chip::new(config.gpio_chip())
                .map_err(|e| TransportError::Unavailable(format!("opening {}: {}", config.gpio_chip(), e)))?;
            let dc = request_output(&mut chip, config.dc_pin(), 0, "roboface-dc")?;
            let rst = request_output(&mut chip, config.reset_pin(), 1, "roboface-rst")?;
            let backlight = config
                .backlight_pin()
                .map(|pin| request_output(&mut chip, pin, 0, "roboface-bl"))
                .transpose()?;

            info!(
                "SPI transport on {} at {} Hz (DC={}, RST={}, BL={:?})",
                path,
                config.spi_speed_hz(),
                config.dc_pin(),
                config.reset_pin(),
                config.backlight_pin()
            );

            Ok(SpiTransport::new(spi, dc, rst, backlight, Delay))
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::LinuxTransport;
