//! S3-compatible photo storage client.
//!
//! This crate provides:
//! - File and byte upload to the photo bucket
//! - Listing of a route's photos and resolution of signed download
//!   addresses
//! - Photo deletion when routes are removed
//! - Key layout helpers and content-type inference for camera captures

pub mod client;
pub mod error;
pub mod photos;

pub use client::{BucketClient, ObjectInfo, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use photos::{
    boulder_photo_key, content_type_for, unique_photo_name, user_photo_key, PhotoStore,
    BOULDER_PHOTO_ROOT, PHOTO_ROOT,
};
