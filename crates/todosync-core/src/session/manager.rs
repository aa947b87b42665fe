use super::event::{ClearReason, ExpiryStatus, RehydrateOutcome, SessionEvent};
use super::model::{Session, SessionSnapshot};
use super::store::SessionStore;
use crate::clock::Clock;
use crate::user::UserProfile;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Owns the single session of the process.
///
/// `SessionManager` is responsible for:
/// - Recording and clearing the session
/// - Writing every state change through to the durable store
/// - Enforcing the TTL at explicit checkpoints (`check_expiry`, `rehydrate`)
/// - Broadcasting lifecycle events to interested components
///
/// All operations are synchronous. The state lock is never held across an
/// `.await`, so each operation is atomic with respect to every other one, and
/// every read observes the latest transition.
pub struct SessionManager {
    state: RwLock<Session>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Creates an anonymous manager. Call [`SessionManager::rehydrate`] once
    /// at startup to pick up a persisted session.
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(Session::anonymous()),
            store,
            clock,
            events,
        }
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Records a freshly authenticated session starting now.
    pub fn set_session(&self, token: impl Into<String>, user: Option<UserProfile>) {
        let session = Session {
            token: Some(token.into()),
            user,
            login_time: Some(self.clock.now()),
            is_authenticated: true,
        };

        {
            let mut state = self.write_state();
            *state = session;
            self.persist(&state);
        }

        tracing::info!("[SessionManager] Session established");
        self.emit(SessionEvent::Established { rehydrated: false });
    }

    /// Replaces the credential after a refresh.
    ///
    /// The server issues a new full-lifetime token, so the TTL window restarts.
    pub fn replace_token(&self, token: impl Into<String>) {
        let user = self.user();
        self.set_session(token, user);
    }

    /// Clears the session after an explicit logout.
    ///
    /// Returns `true` if a session was actually torn down.
    pub fn clear_session(&self) -> bool {
        self.clear_session_with(ClearReason::Logout)
    }

    /// Clears every field and deletes the persisted record.
    ///
    /// Idempotent: clearing an anonymous session only re-clears the store and
    /// emits nothing. Returns `true` if this call performed the transition.
    pub fn clear_session_with(&self, reason: ClearReason) -> bool {
        let transitioned = {
            let mut state = self.write_state();
            self.clear_locked(&mut state)
        };

        if transitioned {
            tracing::info!(?reason, "[SessionManager] Session cleared");
            self.emit(SessionEvent::Cleared { reason });
        } else {
            tracing::debug!(?reason, "[SessionManager] Session already cleared");
        }
        transitioned
    }

    /// Merges `patch` into the current user.
    ///
    /// Does nothing without a session. Never touches the token or login time.
    pub fn update_user(&self, patch: UserProfile) -> bool {
        let mut state = self.write_state();
        if state.token.is_none() {
            tracing::debug!("[SessionManager] update_user ignored: no session");
            return false;
        }

        match state.user.as_mut() {
            Some(user) => user.merge(patch),
            None => state.user = Some(patch),
        }
        self.persist(&state);
        true
    }

    // ============================================================================
    // Expiry
    // ============================================================================

    /// True if there is no login time or the TTL has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.read_state().is_expired_at(self.clock.now())
    }

    /// Expiry checkpoint: clears an authenticated session whose TTL elapsed.
    ///
    /// The test and the reset happen under one write lock, so a session
    /// established concurrently is never cleared as expired. Reports
    /// `Expired` only when this call performed the transition; an anonymous
    /// session is never mutated and reports `Valid`.
    pub fn check_expiry(&self) -> ExpiryStatus {
        let expired = {
            let mut state = self.write_state();
            state.is_authenticated
                && state.is_expired_at(self.clock.now())
                && self.clear_locked(&mut state)
        };

        if expired {
            tracing::info!("[SessionManager] Token expired, logged out");
            self.emit(SessionEvent::Cleared {
                reason: ClearReason::Expired,
            });
            ExpiryStatus::Expired
        } else {
            ExpiryStatus::Valid
        }
    }

    /// Restores the persisted session at startup.
    ///
    /// The persisted record never decides whether the session is
    /// authenticated: expiry is recomputed from its login time against the
    /// current clock. Unusable records are discarded from the store.
    pub fn rehydrate(&self) -> RehydrateOutcome {
        let snapshot = match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "[SessionManager] Persisted session unreadable, discarding");
                self.discard_persisted();
                return RehydrateOutcome::Anonymous;
            }
        };

        let Some(SessionSnapshot {
            token,
            user,
            login_time,
        }) = snapshot
        else {
            tracing::debug!("[SessionManager] No persisted session");
            *self.write_state() = Session::anonymous();
            return RehydrateOutcome::Anonymous;
        };

        let (Some(token), Some(login_time)) = (token, login_time) else {
            tracing::debug!("[SessionManager] Persisted session incomplete, discarding");
            self.discard_persisted();
            return RehydrateOutcome::Anonymous;
        };

        let restored = Session {
            token: Some(token),
            user,
            login_time: Some(login_time),
            is_authenticated: true,
        };

        if restored.is_expired_at(self.clock.now()) {
            tracing::info!("[SessionManager] Stored token expired during rehydration");
            self.discard_persisted();
            return RehydrateOutcome::Expired;
        }

        *self.write_state() = restored;
        tracing::info!("[SessionManager] Restored valid auth session");
        self.emit(SessionEvent::Established { rehydrated: true });
        RehydrateOutcome::Restored
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Copy of the current state.
    pub fn snapshot(&self) -> Session {
        self.read_state().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read_state().token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read_state().user.clone()
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.read_state().login_time
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated
    }

    /// Subscribes to lifecycle events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn persist(&self, state: &Session) {
        if let Err(e) = self.store.save(&state.to_snapshot()) {
            tracing::warn!(error = %e, "[SessionManager] Failed to persist session");
        }
    }

    /// Resets `state` and the store. Returns `true` if a session was torn down.
    fn clear_locked(&self, state: &mut Session) -> bool {
        let transitioned = !state.is_anonymous();
        *state = Session::anonymous();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "[SessionManager] Failed to clear persisted session");
        }
        transitioned
    }

    fn discard_persisted(&self) {
        *self.write_state() = Session::anonymous();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "[SessionManager] Failed to clear persisted session");
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine: nobody is watching the session yet.
        let _ = self.events.send(event);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
