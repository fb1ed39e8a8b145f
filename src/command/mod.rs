/*
 *  command/mod.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command model: request decoding and result encoding
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

use serde_json::{json, Value};

pub mod dispatcher;
pub mod error;

pub use dispatcher::{Dispatcher, DriverState, Lifecycle};
pub use error::CommandError;

use crate::face::Expression;

/// Defaults applied when a request leaves a field out
pub const DEFAULT_EXPRESSION: &str = "neutral";
pub const DEFAULT_TEXT_X: i64 = 10;
pub const DEFAULT_TEXT_Y: i64 = 50;

/// One decoded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetFace { expression: String },
    GetFace,
    Clear,
    CustomText { text: String, x: i64, y: i64 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetFace { .. } => "set_face",
            Command::GetFace => "get_face",
            Command::Clear => "clear",
            Command::CustomText { .. } => "custom_text",
        }
    }

    /// Decode `{"command": ..., ...}`; missing optional fields take defaults
    pub fn from_json(request: &Value) -> Result<Self, CommandError> {
        let name = match request.get("command") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => return Err(CommandError::UnknownCommand(other.to_string())),
            None => return Err(CommandError::UnknownCommand("<missing>".to_string())),
        };

        match name {
            "set_face" => {
                let expression = match request.get("expression") {
                    None | Some(Value::Null) => DEFAULT_EXPRESSION.to_string(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => return Err(CommandError::InvalidExpression(other.to_string())),
                };
                Ok(Command::SetFace { expression })
            }
            "get_face" => Ok(Command::GetFace),
            "clear" => Ok(Command::Clear),
            "custom_text" => {
                let text = match request.get("text") {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                let x = coordinate(request, "x", DEFAULT_TEXT_X)?;
                let y = coordinate(request, "y", DEFAULT_TEXT_Y)?;
                Ok(Command::CustomText { text, x, y })
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Integer coordinate; non-negative floats truncate and numeric strings
/// are accepted. Negative fractions are refused here so truncation can't
/// pull them onto the canvas.
fn coordinate(request: &Value, field: &'static str, default: i64) -> Result<i64, CommandError> {
    let invalid = |reason: String| CommandError::InvalidArgument { field, reason };
    match request.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i),
            (None, Some(f)) if f.is_finite() && f < 0.0 => Err(invalid(format!("{} is negative", n))),
            (None, Some(f)) if f.is_finite() => Ok(f.trunc() as i64),
            _ => Err(invalid(format!("{} is not a usable integer", n))),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(format!("'{}' is not an integer", s))),
        Some(other) => Err(invalid(format!("expected an integer, got {}", other))),
    }
}

/// Successful outcome of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    FaceSet(Expression),
    CurrentFace(Option<Expression>),
    Cleared,
    TextDrawn(String),
}

impl CommandResult {
    pub fn to_json(&self) -> Value {
        match self {
            CommandResult::FaceSet(e) => json!({ "success": true, "expression": e.as_str() }),
            CommandResult::CurrentFace(e) => json!({ "current_face": e.map(Expression::as_str) }),
            CommandResult::Cleared => json!({ "success": true }),
            CommandResult::TextDrawn(text) => json!({ "success": true, "text": text }),
        }
    }
}

/// Error reply: `{"success": false, "error": message, "kind": tag}`
pub fn error_json(err: &CommandError) -> Value {
    json!({ "success": false, "error": err.to_string(), "kind": err.kind() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_face_defaults_to_neutral() {
        let cmd = Command::from_json(&json!({ "command": "set_face" })).unwrap();
        assert_eq!(cmd, Command::SetFace { expression: "neutral".into() });
    }

    #[test]
    fn test_set_face_non_string_expression() {
        let err = Command::from_json(&json!({ "command": "set_face", "expression": 3 })).unwrap_err();
        assert_eq!(err, CommandError::InvalidExpression("3".into()));
    }

    #[test]
    fn test_custom_text_defaults() {
        let cmd = Command::from_json(&json!({ "command": "custom_text" })).unwrap();
        assert_eq!(cmd, Command::CustomText { text: String::new(), x: 10, y: 50 });
    }

    #[test]
    fn test_custom_text_coordinate_forms() {
        let cmd = Command::from_json(&json!({ "command": "custom_text", "text": "hi", "x": 12.9, "y": "40" }))
            .unwrap();
        assert_eq!(cmd, Command::CustomText { text: "hi".into(), x: 12, y: 40 });

        let err = Command::from_json(&json!({ "command": "custom_text", "x": "left" })).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_negative_fraction_is_not_truncated_to_zero() {
        for x in [-0.5, -0.999, -3.2] {
            let err = Command::from_json(&json!({ "command": "custom_text", "text": "hi", "x": x, "y": 0 }))
                .unwrap_err();
            assert!(matches!(err, CommandError::InvalidArgument { field: "x", .. }), "x = {}", x);
        }
        let err = Command::from_json(&json!({ "command": "custom_text", "y": -0.25 })).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument { field: "y", .. }));

        // whole negatives pass through to the canvas bounds check
        let cmd = Command::from_json(&json!({ "command": "custom_text", "x": -1 })).unwrap();
        assert_eq!(cmd, Command::CustomText { text: String::new(), x: -1, y: 50 });
    }

    #[test]
    fn test_unknown_and_missing_command() {
        assert_eq!(
            Command::from_json(&json!({ "command": "dance" })),
            Err(CommandError::UnknownCommand("dance".into()))
        );
        assert!(matches!(
            Command::from_json(&json!({ "expression": "happy" })),
            Err(CommandError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_result_shapes() {
        assert_eq!(
            CommandResult::FaceSet(Expression::Happy).to_json(),
            json!({ "success": true, "expression": "happy" })
        );
        assert_eq!(CommandResult::CurrentFace(None).to_json(), json!({ "current_face": null }));
        assert_eq!(
            CommandResult::CurrentFace(Some(Expression::Sad)).to_json(),
            json!({ "current_face": "sad" })
        );
        assert_eq!(CommandResult::Cleared.to_json(), json!({ "success": true }));
        assert_eq!(
            CommandResult::TextDrawn("Hello".into()).to_json(),
            json!({ "success": true, "text": "Hello" })
        );
    }

    #[test]
    fn test_error_reply() {
        let reply = error_json(&CommandError::NotReady);
        assert_eq!(reply, json!({ "success": false, "error": "Display not ready", "kind": "not_ready" }));
    }
}
