/*
 *  command/dispatcher.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Serialized command execution against the shared display state
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

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{error_json, Command, CommandError, CommandResult};
use crate::config::DisplayConfig;
use crate::display::{BusTransport, DisplayError, Framebuffer, St7735s};
use crate::face::{self, Expression, BACKGROUND};

/// Nothing drawn since start, clear or shutdown
const NO_FACE: u8 = 0;

/// Driver lifecycle; `Failed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Failed,
}

impl Lifecycle {
    fn code(self) -> u8 {
        match self {
            Lifecycle::Uninitialized => 0,
            Lifecycle::Ready => 1,
            Lifecycle::Failed => 2,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            1 => Lifecycle::Ready,
            2 => Lifecycle::Failed,
            _ => Lifecycle::Uninitialized,
        }
    }
}

/// Everything a frame update touches; only reachable through the lock
struct Bus<T> {
    panel: St7735s<T>,
    framebuffer: Framebuffer,
}

impl<T: BusTransport> Bus<T> {
    /// Push a finished frame; it replaces the framebuffer only once the
    /// panel has taken all of it
    fn show(&mut self, frame: Framebuffer) -> Result<(), DisplayError> {
        self.panel.flush(&frame)?;
        self.framebuffer = frame;
        Ok(())
    }

    fn blank_frame(&self) -> Framebuffer {
        let mut frame = self.framebuffer.clone();
        frame.clear(BACKGROUND);
        frame
    }
}

/// Process-wide display state.
///
/// The panel and framebuffer sit behind one FIFO-fair async lock held for
/// render plus push, so frames never interleave on the wire. The current
/// expression and lifecycle are atomics written only while that lock is
/// held; readers never wait on a frame in flight.
pub struct DriverState<T> {
    config: DisplayConfig,
    lifecycle: AtomicU8,
    current: AtomicU8,
    bus: Mutex<Bus<T>>,
}

impl<T: BusTransport> DriverState<T> {
    pub fn new(config: DisplayConfig, transport: T) -> Self {
        let panel = St7735s::new(transport, &config);
        let framebuffer = Framebuffer::new(&config);
        Self {
            config,
            lifecycle: AtomicU8::new(Lifecycle::Uninitialized.code()),
            current: AtomicU8::new(NO_FACE),
            bus: Mutex::new(Bus { panel, framebuffer }),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_code(self.lifecycle.load(Ordering::Acquire))
    }

    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle.code(), Ordering::Release);
    }

    /// Last expression fully pushed to the panel
    pub fn current_face(&self) -> Option<Expression> {
        Expression::from_code(self.current.load(Ordering::Acquire))
    }

    fn set_current(&self, expression: Option<Expression>) {
        self.current
            .store(expression.map_or(NO_FACE, Expression::code), Ordering::Release);
    }

    fn ensure_ready(&self) -> Result<(), CommandError> {
        match self.lifecycle() {
            Lifecycle::Ready => Ok(()),
            _ => Err(CommandError::NotReady),
        }
    }
}

/// Cloneable handle that executes commands against a shared `DriverState`
pub struct Dispatcher<T> {
    state: Arc<DriverState<T>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self { state: Arc::clone(&self.state) }
    }
}

impl<T: BusTransport> Dispatcher<T> {
    pub fn new(config: DisplayConfig, transport: T) -> Self {
        Self::with_state(Arc::new(DriverState::new(config, transport)))
    }

    pub fn with_state(state: Arc<DriverState<T>>) -> Self {
        Self { state }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle()
    }

    /// Reset and configure the panel, then blank it.
    ///
    /// A failure here is permanent: the driver never becomes ready and
    /// every later command reports `NotReady`.
    pub async fn initialize(&self) -> Result<(), CommandError> {
        let mut bus = self.state.bus.lock().await;
        if self.state.lifecycle() == Lifecycle::Failed {
            return Err(CommandError::NotReady);
        }

        let Bus { panel, framebuffer } = &mut *bus;
        framebuffer.clear(BACKGROUND);
        let result = panel.initialize().and_then(|_| panel.flush(framebuffer));
        match result {
            Ok(()) => {
                self.state.set_current(None);
                self.state.set_lifecycle(Lifecycle::Ready);
                let (w, h) = self.state.config.canvas_size();
                info!(
                    "Display ready: {}x{} canvas, rotation {}",
                    w,
                    h,
                    self.state.config.rotation().degrees()
                );
                Ok(())
            }
            Err(e) => {
                self.state.set_lifecycle(Lifecycle::Failed);
                error!("Display initialization failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Render and show an expression by name
    pub async fn set_face(&self, expression: &str) -> Result<Expression, CommandError> {
        self.state.ensure_ready()?;
        let expression: Expression = expression
            .parse()
            .map_err(|_| CommandError::InvalidExpression(expression.to_string()))?;

        let mut bus = self.state.bus.lock().await;
        self.state.ensure_ready()?;

        let mut frame = bus.framebuffer.clone();
        face::render(expression, &mut frame);
        if let Err(e) = bus.show(frame) {
            warn!("Failed to show {}: {}", expression, e);
            return Err(e.into());
        }
        self.state.set_current(Some(expression));
        info!("Face set to {}", expression);
        Ok(expression)
    }

    /// Last successfully shown expression; never waits on the bus
    pub fn get_face(&self) -> Result<Option<Expression>, CommandError> {
        self.state.ensure_ready()?;
        Ok(self.state.current_face())
    }

    /// Blank the panel
    pub async fn clear(&self) -> Result<(), CommandError> {
        self.state.ensure_ready()?;
        let mut bus = self.state.bus.lock().await;
        self.state.ensure_ready()?;

        let frame = bus.blank_frame();
        bus.show(frame)?;
        self.state.set_current(None);
        debug!("Display cleared");
        Ok(())
    }

    /// Show a single text label with its top-left corner at (x, y)
    pub async fn custom_text(&self, text: &str, x: i64, y: i64) -> Result<String, CommandError> {
        self.state.ensure_ready()?;
        let (width, height) = self.state.config.canvas_size();
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
            return Err(CommandError::OutOfBounds { x, y, width, height });
        }

        let mut bus = self.state.bus.lock().await;
        self.state.ensure_ready()?;

        // free text leaves the recorded expression alone
        let mut frame = bus.framebuffer.clone();
        face::render_custom_text(text, x as u32, y as u32, &mut frame);
        bus.show(frame)?;
        info!("Text {:?} shown at ({}, {})", text, x, y);
        Ok(text.to_string())
    }

    pub async fn execute(&self, command: Command) -> Result<CommandResult, CommandError> {
        debug!("Executing {}", command.name());
        match command {
            Command::SetFace { expression } => self.set_face(&expression).await.map(CommandResult::FaceSet),
            Command::GetFace => self.get_face().map(CommandResult::CurrentFace),
            Command::Clear => self.clear().await.map(|_| CommandResult::Cleared),
            Command::CustomText { text, x, y } => {
                self.custom_text(&text, x, y).await.map(CommandResult::TextDrawn)
            }
        }
    }

    /// Decode, execute and encode one JSON request
    pub async fn handle_json(&self, request: &Value) -> Value {
        let outcome = match Command::from_json(request) {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(result) => result.to_json(),
            Err(e) => {
                if e.is_validation() {
                    debug!("Rejected request {}: {}", request, e);
                } else {
                    warn!("Request {} failed: {}", request, e);
                }
                error_json(&e)
            }
        }
    }

    /// Blank the panel and put it to sleep; later commands report `NotReady`
    pub async fn shutdown(&self) -> Result<(), CommandError> {
        let mut bus = self.state.bus.lock().await;
        if self.state.lifecycle() != Lifecycle::Ready {
            return Ok(());
        }
        self.state.set_lifecycle(Lifecycle::Uninitialized);
        self.state.set_current(None);

        let frame = bus.blank_frame();
        let result = bus.show(frame).and_then(|_| bus.panel.sleep());
        match result {
            Ok(()) => {
                info!("Display shut down");
                Ok(())
            }
            Err(e) => {
                warn!("Display shutdown incomplete: {}", e);
                Err(e.into())
            }
        }
    }

    /// Copy of the framebuffer in panel byte order
    pub async fn frame_snapshot(&self) -> Vec<u8> {
        self.state.bus.lock().await.framebuffer.as_bytes()
    }
}
