//! User profile records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A user record in the realtime database, keyed by the identity-provider
/// subject.
///
/// Created implicitly on first authenticated session. `route_setter` is the
/// only field mutated after creation, and only by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity-provider subject
    pub uid: String,

    /// Display name
    pub display_name: String,

    /// Email, absent for anonymous accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Profile photo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Whether the user may set routes
    #[serde(default)]
    pub route_setter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_setter_defaults_to_false() {
        let json = r#"{"uid": "u1", "displayName": "Mara"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert!(!profile.route_setter);
        assert_eq!(profile.display_name, "Mara");
        assert!(profile.email.is_none());
    }

    #[test]
    fn absent_optionals_are_omitted_on_the_wire() {
        let profile = UserProfile {
            uid: "u1".to_string(),
            display_name: "Mara".to_string(),
            email: None,
            photo_url: None,
            route_setter: true,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("photoUrl").is_none());
        assert_eq!(json["routeSetter"], true);
    }
}
