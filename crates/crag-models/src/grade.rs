//! Boulder grade vocabulary.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fontainebleau grades used on the gym walls.
///
/// Declaration order is difficulty order, so `Ord` compares grades directly.
/// Grades serialize as their display string (e.g. `"6a+"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Grade {
    #[serde(rename = "4")]
    F4,
    #[serde(rename = "4+")]
    F4Plus,
    #[serde(rename = "5")]
    F5,
    #[serde(rename = "5+")]
    F5Plus,
    #[serde(rename = "6a")]
    F6a,
    #[serde(rename = "6a+")]
    F6aPlus,
    #[serde(rename = "6b")]
    F6b,
    #[serde(rename = "6b+")]
    F6bPlus,
    #[serde(rename = "6c")]
    F6c,
    #[serde(rename = "6c+")]
    F6cPlus,
    #[serde(rename = "7a")]
    F7a,
    #[serde(rename = "7a+")]
    F7aPlus,
    #[serde(rename = "7b")]
    F7b,
    #[serde(rename = "7b+")]
    F7bPlus,
    #[serde(rename = "7c")]
    F7c,
    #[serde(rename = "7c+")]
    F7cPlus,
    #[serde(rename = "8a")]
    F8a,
    #[serde(rename = "8a+")]
    F8aPlus,
    #[serde(rename = "8b")]
    F8b,
    #[serde(rename = "8b+")]
    F8bPlus,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::F4 => "4",
            Grade::F4Plus => "4+",
            Grade::F5 => "5",
            Grade::F5Plus => "5+",
            Grade::F6a => "6a",
            Grade::F6aPlus => "6a+",
            Grade::F6b => "6b",
            Grade::F6bPlus => "6b+",
            Grade::F6c => "6c",
            Grade::F6cPlus => "6c+",
            Grade::F7a => "7a",
            Grade::F7aPlus => "7a+",
            Grade::F7b => "7b",
            Grade::F7bPlus => "7b+",
            Grade::F7c => "7c",
            Grade::F7cPlus => "7c+",
            Grade::F8a => "8a",
            Grade::F8aPlus => "8a+",
            Grade::F8b => "8b",
            Grade::F8bPlus => "8b+",
        }
    }

    /// All grades in ascending difficulty order.
    pub fn all() -> &'static [Grade] {
        &[
            Grade::F4,
            Grade::F4Plus,
            Grade::F5,
            Grade::F5Plus,
            Grade::F6a,
            Grade::F6aPlus,
            Grade::F6b,
            Grade::F6bPlus,
            Grade::F6c,
            Grade::F6cPlus,
            Grade::F7a,
            Grade::F7aPlus,
            Grade::F7b,
            Grade::F7bPlus,
            Grade::F7c,
            Grade::F7cPlus,
            Grade::F8a,
            Grade::F8aPlus,
            Grade::F8b,
            Grade::F8bPlus,
        ]
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a known grade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown grade: {0}")]
pub struct ParseGradeError(pub String);

impl FromStr for Grade {
    type Err = ParseGradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::all()
            .iter()
            .find(|g| g.as_str() == s)
            .copied()
            .ok_or_else(|| ParseGradeError(s.to_string()))
    }
}
