//! Hold color labels.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color label of a boulder's holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum HoldColor {
    Yellow,
    Green,
    Blue,
    Red,
    Orange,
    Purple,
    Black,
    White,
    Pink,
}

impl HoldColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldColor::Yellow => "yellow",
            HoldColor::Green => "green",
            HoldColor::Blue => "blue",
            HoldColor::Red => "red",
            HoldColor::Orange => "orange",
            HoldColor::Purple => "purple",
            HoldColor::Black => "black",
            HoldColor::White => "white",
            HoldColor::Pink => "pink",
        }
    }
}

impl fmt::Display for HoldColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a known hold color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hold color: {0}")]
pub struct ParseHoldColorError(pub String);

impl FromStr for HoldColor {
    type Err = ParseHoldColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yellow" => Ok(HoldColor::Yellow),
            "green" => Ok(HoldColor::Green),
            "blue" => Ok(HoldColor::Blue),
            "red" => Ok(HoldColor::Red),
            "orange" => Ok(HoldColor::Orange),
            "purple" => Ok(HoldColor::Purple),
            "black" => Ok(HoldColor::Black),
            "white" => Ok(HoldColor::White),
            "pink" => Ok(HoldColor::Pink),
            _ => Err(ParseHoldColorError(s.to_string())),
        }
    }
}
