/*
 *  display/recorder.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording bus transport for testing and headless runs
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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::error::TransportError;
use crate::display::panel::cmd;
use crate::display::transport::BusTransport;

/// One observable action on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Reset,
    Command(u8),
    Data(Vec<u8>),
    Delay(u32),
    Backlight(bool),
}

/// Shared log behind every clone of a recorder
#[derive(Debug, Default)]
struct RecorderState {
    /// Every event in bus order (empty when discarding)
    events: Vec<BusEvent>,

    /// Successful command + data writes
    writes: usize,

    /// Total data bytes written
    bytes_written: usize,

    /// Fail the write whose index equals this value, and every one after
    fail_at_write: Option<usize>,

    /// Fail the next reset pulse
    fail_reset: bool,

    discard: bool,
}

/// Byte-sequence recorder standing in for the SPI bus.
///
/// Clones share one log, so a test keeps a handle while the dispatcher
/// owns the transport.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that counts traffic but keeps no event log
    pub fn discarding() -> Self {
        let transport = Self::default();
        transport.lock().discard = true;
        transport
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.lock().events.clone()
    }

    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn bytes_written(&self) -> usize {
        self.lock().bytes_written
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Make the n-th write from now (0-based) and all later writes fail
    pub fn fail_after(&self, n: usize) {
        let mut state = self.lock();
        state.fail_at_write = Some(state.writes + n);
    }

    pub fn fail_reset(&self, fail: bool) {
        self.lock().fail_reset = fail;
    }

    pub fn heal(&self) {
        let mut state = self.lock();
        state.fail_at_write = None;
        state.fail_reset = false;
    }

    /// Pixel payloads in bus order: the data following each RAMWR,
    /// concatenated until the next non-data event.
    pub fn pixel_streams(&self) -> Vec<Vec<u8>> {
        let state = self.lock();
        let mut streams = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in &state.events {
            match event {
                BusEvent::Data(bytes) => {
                    if let Some(stream) = current.as_mut() {
                        stream.extend_from_slice(bytes);
                    }
                }
                BusEvent::Command(cmd::RAMWR) => {
                    streams.extend(current.take());
                    current = Some(Vec::new());
                }
                _ => streams.extend(current.take()),
            }
        }
        streams.extend(current);
        streams
    }

    fn record(&self, event: BusEvent) -> Result<(), TransportError> {
        let mut state = self.lock();
        if let Some(limit) = state.fail_at_write {
            if state.writes >= limit {
                return Err(TransportError::Spi("simulated transfer failure".to_string()));
            }
        }
        state.writes += 1;
        if let BusEvent::Data(bytes) = &event {
            state.bytes_written += bytes.len();
        }
        if !state.discard {
            state.events.push(event);
        }
        Ok(())
    }
}

impl BusTransport for RecordingTransport {
    fn reset(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.fail_reset {
            return Err(TransportError::Gpio("simulated reset line failure".to_string()));
        }
        if !state.discard {
            state.events.push(BusEvent::Reset);
        }
        Ok(())
    }

    fn write_command(&mut self, command: u8) -> Result<(), TransportError> {
        self.record(BusEvent::Command(command))
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.record(BusEvent::Data(data.to_vec()))
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut state = self.lock();
        if !state.discard {
            state.events.push(BusEvent::Delay(ms));
        }
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.discard {
            state.events.push(BusEvent::Backlight(on));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_shares_log() {
        let handle = RecordingTransport::new();
        let mut owned = handle.clone();

        owned.write_command(0x11).unwrap();
        owned.write_data(&[1, 2, 3]).unwrap();

        assert_eq!(handle.events(), vec![BusEvent::Command(0x11), BusEvent::Data(vec![1, 2, 3])]);
        assert_eq!(handle.writes(), 2);
        assert_eq!(handle.bytes_written(), 3);
    }

    #[test]
    fn test_simulated_failure() {
        let handle = RecordingTransport::new();
        let mut owned = handle.clone();

        handle.fail_after(1);
        assert!(owned.write_command(0x2C).is_ok());
        assert!(owned.write_data(&[0; 4]).is_err());
        assert!(owned.write_command(0x2C).is_err());

        handle.heal();
        assert!(owned.write_command(0x2C).is_ok());
        assert_eq!(handle.writes(), 2);
    }

    #[test]
    fn test_discarding_keeps_counters_only() {
        let mut t = RecordingTransport::discarding();
        t.reset().unwrap();
        t.write_data(&[0; 64]).unwrap();
        assert!(t.events().is_empty());
        assert_eq!(t.bytes_written(), 64);
    }

    #[test]
    fn test_pixel_streams_split_on_commands() {
        let handle = RecordingTransport::new();
        let mut t = handle.clone();
        t.write_command(cmd::RAMWR).unwrap();
        t.write_data(&[1, 2]).unwrap();
        t.write_data(&[3]).unwrap();
        t.write_command(cmd::CASET).unwrap();
        t.write_data(&[0, 0, 0, 9]).unwrap();
        t.write_command(cmd::RAMWR).unwrap();
        t.write_data(&[4]).unwrap();

        assert_eq!(handle.pixel_streams(), vec![vec![1, 2, 3], vec![4]]);
    }
}
