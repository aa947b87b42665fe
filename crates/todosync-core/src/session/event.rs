//! Session lifecycle events.

use serde::{Deserialize, Serialize};

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    /// Explicit logout.
    Logout,
    /// The TTL elapsed (expiry checkpoint or rehydration).
    Expired,
    /// A request was answered with 401.
    Unauthorized,
    /// The server rejected a credential the client still considered valid.
    Desync,
    /// The account itself was deleted.
    AccountDeleted,
}

/// Broadcast by the session manager on every real state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session became authenticated, either by login or by rehydration.
    Established { rehydrated: bool },
    /// The session became anonymous.
    Cleared { reason: ClearReason },
}

/// Result of an explicit expiry checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Valid,
    Expired,
}

/// What `rehydrate` found in the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RehydrateOutcome {
    /// Nothing usable was persisted.
    Anonymous,
    /// A valid session was restored.
    Restored,
    /// A session was persisted but its TTL had elapsed; it was discarded.
    Expired,
}
