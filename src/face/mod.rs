/*
 *  face/mod.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Facial expressions and their rendering
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
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod geometry;
pub mod renderer;

pub use renderer::{render, render_custom_text, BACKGROUND, TEXT_COLOR};

/// Closed set of faces the display can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Happy,
    Sad,
    Surprised,
    Sleepy,
    Angry,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown expression '{0}'")]
pub struct UnknownExpression(pub String);

impl Expression {
    pub const ALL: [Expression; 6] = [
        Expression::Happy,
        Expression::Sad,
        Expression::Surprised,
        Expression::Sleepy,
        Expression::Angry,
        Expression::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Surprised => "surprised",
            Expression::Sleepy => "sleepy",
            Expression::Angry => "angry",
            Expression::Neutral => "neutral",
        }
    }

    /// Non-zero tag for lock-free storage; 0 means nothing shown
    pub(crate) fn code(self) -> u8 {
        match self {
            Expression::Happy => 1,
            Expression::Sad => 2,
            Expression::Surprised => 3,
            Expression::Sleepy => 4,
            Expression::Angry => 5,
            Expression::Neutral => 6,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Comma separated list of every expression name
    pub fn names() -> String {
        Self::ALL.map(Expression::as_str).join(", ")
    }
}

impl FromStr for Expression {
    type Err = UnknownExpression;

    /// Exact, case-sensitive match on the lowercase name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownExpression(s.to_string()))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names() {
        for e in Expression::ALL {
            assert_eq!(e.as_str().parse::<Expression>(), Ok(e));
            assert_eq!(Expression::from_code(e.code()), Some(e));
        }
        assert_eq!(Expression::from_code(0), None);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Happy".parse::<Expression>().is_err());
        assert!(" happy".parse::<Expression>().is_err());
        assert_eq!(
            "confused".parse::<Expression>(),
            Err(UnknownExpression("confused".to_string()))
        );
        assert!("thinking".parse::<Expression>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Expression::Sleepy).unwrap(), "\"sleepy\"");
        let e: Expression = serde_json::from_str("\"angry\"").unwrap();
        assert_eq!(e, Expression::Angry);
    }

    #[test]
    fn test_names_list() {
        assert_eq!(Expression::names(), "happy, sad, surprised, sleepy, angry, neutral");
    }
}
