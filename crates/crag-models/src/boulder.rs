//! Boulder route records.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::HoldColor;
use crate::grade::Grade;

/// Identifier of a gym wall.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct WallId(pub String);

impl WallId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WallId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A boulder route on a gym wall, as stored in the realtime database.
///
/// The record carries no identifier of its own: keys are generated by the
/// backend at insertion and attached to snapshots by the collection adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Boulder {
    /// Setter's note describing the route
    pub note: String,

    /// Wall the route is set on
    pub wall: WallId,

    /// Difficulty grade
    pub grade: Grade,

    /// Whether the route is currently up on the wall
    pub active: bool,

    /// Hold color label
    pub color: HoldColor,

    /// Like counter
    #[serde(default)]
    pub likes: u32,

    /// Ascent counter
    #[serde(default)]
    pub ascents: u32,

    /// Display name of the user who created the route
    pub setter_name: String,
}

impl Boulder {
    /// Create a new active route with zeroed counters.
    pub fn new(
        note: impl Into<String>,
        wall: impl Into<WallId>,
        grade: Grade,
        color: HoldColor,
        setter_name: impl Into<String>,
    ) -> Self {
        Self {
            note: note.into(),
            wall: wall.into(),
            grade,
            active: true,
            color,
            likes: 0,
            ascents: 0,
            setter_name: setter_name.into(),
        }
    }
}
