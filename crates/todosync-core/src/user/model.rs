//! User profile and authentication payloads.

use crate::error::{Result, TodoSyncError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile fields as returned by the server.
///
/// The server owns the shape of the profile (`id`, `username`, `is_active`,
/// timestamps, ...), so the client keeps it as an ordered field map and only
/// interprets the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Shallow merge: every field of `patch` overwrites the same field here.
    pub fn merge(&mut self, patch: UserProfile) {
        for (field, value) in patch.0 {
            self.0.insert(field, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Username/password pair used by both login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(TodoSyncError::validation("Username is required"));
        }
        if self.password.is_empty() {
            return Err(TodoSyncError::validation("Password is required"));
        }
        Ok(())
    }
}

/// Response of `/api/auth/login` and `/api/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body of `PUT /api/users/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.username.is_none() && self.password.is_none() {
            return Err(TodoSyncError::validation("Nothing to update"));
        }
        if let Some(username) = &self.username
            && username.trim().is_empty()
        {
            return Err(TodoSyncError::validation("Username cannot be empty"));
        }
        Ok(())
    }
}

/// Body of `DELETE /api/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDeletion {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_accessors() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": "u-1", "username": "alice", "is_active": true}))
                .unwrap();
        assert_eq!(profile.id(), Some("u-1"));
        assert_eq!(profile.username(), Some("alice"));
        assert_eq!(profile.get("is_active"), Some(&json!(true)));
    }

    #[test]
    fn test_merge_overwrites_and_keeps_other_fields() {
        let mut profile = UserProfile::new().with("id", "u-1").with("username", "alice");
        profile.merge(UserProfile::new().with("username", "alice2").with("is_active", true));

        assert_eq!(profile.id(), Some("u-1"));
        assert_eq!(profile.username(), Some("alice2"));
        assert_eq!(profile.get("is_active"), Some(&json!(true)));
    }

    #[test]
    fn test_token_response_without_user() {
        let response: TokenResponse =
            serde_json::from_value(json!({"access_token": "abc"})).unwrap();
        assert_eq!(response.access_token, "abc");
        assert_eq!(response.token_type, "bearer");
        assert!(response.user.is_none());
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("alice", "secret").validate().is_ok());
        assert!(Credentials::new("  ", "secret").validate().is_err());
        assert!(Credentials::new("alice", "").validate().is_err());
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            username: Some("bob".into()),
            password: None,
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"username": "bob"}));
        assert!(ProfileUpdate::default().validate().is_err());
    }
}
