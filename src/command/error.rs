/*
 *  command/error.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Errors reported back to command callers
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

use thiserror::Error;

use crate::display::DisplayError;
use crate::face::Expression;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Display not ready")]
    NotReady,

    #[error("Invalid expression '{0}'. Must be one of: {names}", names = Expression::names())]
    InvalidExpression(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("Coordinates ({x}, {y}) are outside the {width}x{height} display")]
    OutOfBounds { x: i64, y: i64, width: u32, height: u32 },

    #[error("{0}")]
    Display(#[from] DisplayError),
}

impl CommandError {
    /// Stable machine-readable tag for the `kind` field of error replies
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::NotReady => "not_ready",
            CommandError::InvalidExpression(_) => "invalid_expression",
            CommandError::UnknownCommand(_) => "unknown_command",
            CommandError::InvalidArgument { .. } => "invalid_argument",
            CommandError::OutOfBounds { .. } => "out_of_bounds",
            CommandError::Display(DisplayError::Transport(_)) => "transport_error",
            CommandError::Display(_) => "display_error",
        }
    }

    /// True for failures raised before any bus traffic happened
    pub fn is_validation(&self) -> bool {
        !matches!(self, CommandError::Display(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TransportError;

    #[test]
    fn test_invalid_expression_lists_choices() {
        let msg = CommandError::InvalidExpression("confused".into()).to_string();
        assert_eq!(
            msg,
            "Invalid expression 'confused'. Must be one of: happy, sad, surprised, sleepy, angry, neutral"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CommandError::NotReady.kind(), "not_ready");
        let transport = CommandError::from(DisplayError::Transport(TransportError::Spi("x".into())));
        assert_eq!(transport.kind(), "transport_error");
        assert!(!transport.is_validation());
        let oob = CommandError::OutOfBounds { x: -1, y: 0, width: 160, height: 128 };
        assert_eq!(oob.kind(), "out_of_bounds");
        assert!(oob.is_validation());
    }
}
