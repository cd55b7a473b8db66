//! Typed repositories for the boulder and user collections.

use futures_util::stream::Stream;
use serde_json::json;
use tracing::info;

use crag_auth::AuthUser;
use crag_models::{Boulder, UserProfile};

use crate::client::RtdbClient;
use crate::error::RtdbResult;
use crate::live::Keyed;

/// Collection path of the boulder routes.
pub const BOULDERS_PATH: &str = "boulders";

/// Collection path of the user profiles, keyed by identity subject.
pub const USERS_PATH: &str = "users";

/// Repository for boulder route records.
#[derive(Clone)]
pub struct BoulderRepository {
    client: RtdbClient,
}

impl BoulderRepository {
    pub fn new(client: RtdbClient) -> Self {
        Self { client }
    }

    /// Insert a new route. The backend generates and returns the key.
    pub async fn add(&self, boulder: &Boulder) -> RtdbResult<String> {
        let key = self.client.push(BOULDERS_PATH, boulder).await?;
        info!(key = %key, wall = %boulder.wall, grade = %boulder.grade, "Created boulder");
        Ok(key)
    }

    /// Delete a route by key. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &str) -> RtdbResult<()> {
        self.client
            .delete(&format!("{}/{}", BOULDERS_PATH, key))
            .await?;
        info!(key = %key, "Deleted boulder");
        Ok(())
    }

    /// Observe the full route collection. See [`RtdbClient::watch`].
    pub fn watch(&self) -> impl Stream<Item = RtdbResult<Vec<Keyed<Boulder>>>> + Send {
        self.client.watch(BOULDERS_PATH)
    }
}

/// Repository for user profile records.
#[derive(Clone)]
pub struct UserRepository {
    client: RtdbClient,
}

impl UserRepository {
    pub fn new(client: RtdbClient) -> Self {
        Self { client }
    }

    fn profile_path(uid: &str) -> String {
        format!("{}/{}", USERS_PATH, uid)
    }

    /// Point lookup by identity subject.
    pub async fn get(&self, uid: &str) -> RtdbResult<Option<UserProfile>> {
        self.client.get(&Self::profile_path(uid)).await
    }

    /// Fetch the profile for an authenticated principal, creating it on the
    /// first session. An existing profile is returned untouched.
    pub async fn ensure_profile(&self, user: &AuthUser) -> RtdbResult<UserProfile> {
        if let Some(existing) = self.get(&user.uid).await? {
            return Ok(existing);
        }

        let profile = UserProfile {
            uid: user.uid.clone(),
            display_name: user
                .display_name
                .clone()
                .unwrap_or_else(|| "Climber".to_string()),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
            route_setter: false,
        };
        self.client.put(&Self::profile_path(&user.uid), &profile).await?;
        info!(uid = %user.uid, "Created user profile");
        Ok(profile)
    }

    /// Toggle the route-setter flag. Field-level update; the rest of the
    /// profile is left as-is.
    pub async fn set_route_setter(&self, uid: &str, route_setter: bool) -> RtdbResult<()> {
        self.client
            .update(&Self::profile_path(uid), &json!({ "routeSetter": route_setter }))
            .await?;
        info!(uid = %uid, route_setter, "Updated route-setter flag");
        Ok(())
    }

    /// Observe the full user collection. See [`RtdbClient::watch`].
    pub fn watch(&self) -> impl Stream<Item = RtdbResult<Vec<Keyed<UserProfile>>>> + Send {
        self.client.watch(USERS_PATH)
    }
}
