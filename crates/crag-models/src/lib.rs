//! Shared data models for the Crag gym backend.
//!
//! This crate provides Serde-serializable types for:
//! - Boulder route records and the grade/color vocabularies
//! - User profiles and the route-setter role flag
//! - Wall identifiers

pub mod boulder;
pub mod color;
pub mod grade;
pub mod user;

// Re-export common types
pub use boulder::{Boulder, WallId};
pub use color::{HoldColor, ParseHoldColorError};
pub use grade::{Grade, ParseGradeError};
pub use user::UserProfile;
