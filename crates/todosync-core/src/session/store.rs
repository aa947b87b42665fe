//! Durable session store.
//!
//! Defines the persistence seam of the session manager.

use super::model::SessionSnapshot;
use crate::error::Result;
use std::sync::Mutex;

/// Key-value persistence for the single session record.
///
/// The session manager is the only writer. Implementations must make `clear`
/// idempotent: clearing an absent record succeeds.
pub trait SessionStore: Send + Sync {
    /// Loads the persisted snapshot.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: A record exists
    /// - `Ok(None)`: Nothing has been persisted
    /// - `Err(_)`: The record exists but could not be read
    fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Replaces the persisted snapshot.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Removes the persisted snapshot.
    fn clear(&self) -> Result<()>;
}

/// Process-local store, used by tests and embedders that do not need the
/// session to survive a restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    snapshot: Mutex<Option<SessionSnapshot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `snapshot`, as if written by a
    /// previous run.
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// Current record, for assertions.
    pub fn stored(&self) -> Option<SessionSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.stored())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let mut stored = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        *stored = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut stored = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        *stored = None;
        Ok(())
    }
}
