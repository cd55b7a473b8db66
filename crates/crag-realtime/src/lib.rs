//! Realtime database REST client.
//!
//! This crate provides:
//! - Node operations (get, put, push-with-generated-key, field merge,
//!   idempotent delete) over the database's REST surface
//! - The live collection adapter: a cold, observer-scoped stream that
//!   re-emits the full keyed snapshot on every backend change and tears the
//!   listener down when dropped
//! - Typed repositories for the `boulders` and `users` collections
//! - Session-token attachment through [`crag_auth::TokenSource`]

pub mod client;
pub mod error;
pub mod live;
pub mod metrics;
pub mod repos;

mod sse;

pub use client::{RtdbClient, RtdbConfig};
pub use error::{RtdbError, RtdbResult};
pub use live::Keyed;
pub use repos::{BoulderRepository, UserRepository, BOULDERS_PATH, USERS_PATH};
