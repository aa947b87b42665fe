//! Session domain model.
//!
//! `Session` is the in-memory authentication state; `SessionSnapshot` is the
//! subset that survives a restart.

use crate::user::UserProfile;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Fixed lifetime of a session, measured from the last successful login.
pub const SESSION_TTL: Duration = Duration::hours(24);

/// Name under which the snapshot is persisted.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// The client-side authenticated identity.
///
/// Invariants, asserted at explicit checkpoints by the manager:
/// - `is_authenticated` implies a token and `now - login_time < SESSION_TTL`
/// - a token implies a `login_time`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub login_time: Option<DateTime<Utc>>,
    pub is_authenticated: bool,
}

impl Session {
    /// The pristine anonymous session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        *self == Self::anonymous()
    }

    /// True if there is no login time or the TTL has fully elapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.login_time {
            Some(login_time) => now - login_time >= SESSION_TTL,
            None => true,
        }
    }

    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token.clone(),
            user: self.user.clone(),
            login_time: self.login_time,
        }
    }
}

/// Persisted session record.
///
/// There is deliberately no authenticated flag: it is recomputed from
/// `login_time` every time the record is loaded. Unknown fields (including a
/// flag written by older clients) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(
        default,
        rename = "loginTime",
        alias = "login_time",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub login_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_boundary() {
        let login = Utc::now();
        let session = Session {
            token: Some("t".into()),
            user: None,
            login_time: Some(login),
            is_authenticated: true,
        };

        let just_below = login + SESSION_TTL - Duration::milliseconds(1);
        assert!(!session.is_expired_at(just_below));
        assert!(session.is_expired_at(login + SESSION_TTL));
        assert!(session.is_expired_at(login + Duration::milliseconds(86_400_000)));
    }

    #[test]
    fn test_missing_login_time_is_expired() {
        assert!(Session::anonymous().is_expired_at(Utc::now()));
    }

    #[test]
    fn test_snapshot_ignores_persisted_flag() {
        let snapshot: SessionSnapshot = serde_json::from_value(json!({
            "token": "abc",
            "user": {"id": "u-1"},
            "loginTime": 1_700_000_000_000i64,
            "isAuthenticated": true
        }))
        .unwrap();

        assert_eq!(snapshot.token.as_deref(), Some("abc"));
        assert_eq!(
            snapshot.login_time.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn test_snapshot_writes_epoch_millis() {
        let login = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let snapshot = SessionSnapshot {
            token: Some("abc".into()),
            user: None,
            login_time: Some(login),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["loginTime"], json!(1_700_000_000_123i64));
        assert!(value.get("isAuthenticated").is_none());
    }
}
