//! Photo storage operations.
//!
//! Photos live under two roots: `photo/{user_id}/{file_name}` for profile
//! captures and `boulders/{boulder_key}/{file_name}` for route photos.

use std::path::Path;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::client::BucketClient;
use crate::error::{StorageError, StorageResult};

/// Root prefix of user profile photos.
pub const PHOTO_ROOT: &str = "photo";

/// Root prefix of boulder route photos.
pub const BOULDER_PHOTO_ROOT: &str = "boulders";

/// Lifetime of resolved download addresses.
const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(3600);

/// Storage key of a user profile photo.
pub fn user_photo_key(user_id: &str, file_name: &str) -> StorageResult<String> {
    validate_segment(user_id)?;
    validate_segment(file_name)?;
    Ok(format!("{}/{}/{}", PHOTO_ROOT, user_id, file_name))
}

/// Storage key of a boulder route photo.
pub fn boulder_photo_key(boulder_key: &str, file_name: &str) -> StorageResult<String> {
    validate_segment(boulder_key)?;
    validate_segment(file_name)?;
    Ok(format!("{}/{}/{}", BOULDER_PHOTO_ROOT, boulder_key, file_name))
}

/// Generate a unique file name for a fresh camera capture.
pub fn unique_photo_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension.trim_start_matches('.'))
}

/// Content type inferred from a file name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn validate_segment(segment: &str) -> StorageResult<()> {
    if segment.is_empty() {
        return Err(StorageError::invalid_key("empty path segment"));
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(StorageError::invalid_key(format!(
            "path separator in segment: {}",
            segment
        )));
    }
    Ok(())
}

/// High-level photo gateway over the bucket client.
#[derive(Clone)]
pub struct PhotoStore {
    client: BucketClient,
}

impl PhotoStore {
    pub fn new(client: BucketClient) -> Self {
        Self { client }
    }

    /// Upload a locally captured profile photo.
    pub async fn upload_user_photo(
        &self,
        user_id: &str,
        file_name: &str,
        path: impl AsRef<Path>,
    ) -> StorageResult<String> {
        let key = user_photo_key(user_id, file_name)?;
        self.client
            .upload_file(path, &key, content_type_for(file_name))
            .await?;
        Ok(key)
    }

    /// Upload a locally captured route photo.
    pub async fn upload_boulder_photo(
        &self,
        boulder_key: &str,
        file_name: &str,
        path: impl AsRef<Path>,
    ) -> StorageResult<String> {
        let key = boulder_photo_key(boulder_key, file_name)?;
        self.client
            .upload_file(path, &key, content_type_for(file_name))
            .await?;
        Ok(key)
    }

    /// Resolve download addresses for every photo of a route, in the
    /// backend's listing order.
    pub async fn boulder_photo_urls(&self, boulder_key: &str) -> StorageResult<Vec<String>> {
        validate_segment(boulder_key)?;
        let prefix = format!("{}/{}/", BOULDER_PHOTO_ROOT, boulder_key);
        let objects = self.client.list_objects(&prefix).await?;

        let mut urls = Vec::with_capacity(objects.len());
        for object in objects {
            urls.push(self.client.presign_get(&object.key, DOWNLOAD_URL_TTL).await?);
        }
        Ok(urls)
    }

    /// Read a route photo back as bytes.
    pub async fn download_boulder_photo(
        &self,
        boulder_key: &str,
        file_name: &str,
    ) -> StorageResult<Vec<u8>> {
        let key = boulder_photo_key(boulder_key, file_name)?;
        self.client.download_bytes(&key).await
    }

    /// Remove every photo of a route. Used when the route itself is
    /// deleted.
    pub async fn delete_boulder_photos(&self, boulder_key: &str) -> StorageResult<u32> {
        validate_segment(boulder_key)?;
        let prefix = format!("{}/{}/", BOULDER_PHOTO_ROOT, boulder_key);
        let keys: Vec<String> = self
            .client
            .list_objects(&prefix)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect();

        let deleted = self.client.delete_objects(&keys).await?;
        if deleted > 0 {
            info!(boulder_key = %boulder_key, deleted, "Removed route photos");
        }
        Ok(deleted)
    }
}
