//! Session watchdog.
//!
//! Re-checks session expiry on a fixed interval while a session is
//! authenticated, and reconciles the session against a live profile fetch
//! each time one is established.

use crate::teardown::SessionTeardown;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use todosync_core::config::SessionSettings;
use todosync_core::session::{ClearReason, ExpiryStatus, SessionEvent, SessionManager};
use todosync_core::user::ProfileFetcher;

struct Shared {
    session: Arc<SessionManager>,
    profile: Arc<dyn ProfileFetcher>,
    teardown: Arc<SessionTeardown>,
    interval: Duration,
    ticking: AtomicBool,
}

/// Expiry timer of one authenticated session.
struct Ticker {
    credential: Option<String>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic expiry checker and desync detector.
///
/// The watchdog follows the session manager's lifecycle events: a ticker
/// runs only between `Established` and `Cleared`, so no timer survives a
/// logout. Both the supervisor and its ticker stop on [`SessionWatchdog::shutdown`].
pub struct SessionWatchdog {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl SessionWatchdog {
    pub fn new(
        session: Arc<SessionManager>,
        profile: Arc<dyn ProfileFetcher>,
        teardown: Arc<SessionTeardown>,
        settings: &SessionSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                session,
                profile,
                teardown,
                interval: settings.watchdog_interval(),
                ticking: AtomicBool::new(false),
            }),
            shutdown: CancellationToken::new(),
            supervisor: Mutex::new(None),
        }
    }

    /// Spawns the supervisor on the current runtime. Calling it again while
    /// running does nothing.
    pub fn start(&self) {
        let mut supervisor = self.supervisor.lock().unwrap_or_else(|e| e.into_inner());
        if supervisor.is_some() {
            return;
        }

        // Subscribe before looking at the current state so no transition
        // falls between the two.
        let events = self.shared.session.subscribe();
        let shared = self.shared.clone();
        let shutdown = self.shutdown.clone();

        *supervisor = Some(tokio::spawn(supervise(shared, events, shutdown)));
        tracing::info!(
            interval_secs = self.shared.interval.as_secs(),
            "[SessionWatchdog] Started"
        );
    }

    /// Stops the supervisor and any running timer, and waits for them.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self
            .supervisor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "[SessionWatchdog] Supervisor ended abnormally");
            }
        }
        tracing::info!("[SessionWatchdog] Stopped");
    }

    /// True while an expiry timer is active.
    pub fn is_ticking(&self) -> bool {
        self.shared.ticking.load(Ordering::SeqCst)
    }
}

async fn supervise(
    shared: Arc<Shared>,
    mut events: broadcast::Receiver<SessionEvent>,
    shutdown: CancellationToken,
) {
    // Transitions queued before the first poll are already reflected in
    // the state read below.
    loop {
        match events.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    let mut ticker = None;
    if shared.session.is_authenticated() {
        ticker = Some(begin(&shared, &shutdown));
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Ok(SessionEvent::Established { rehydrated }) => {
                    if is_current(&shared, ticker.as_ref()) {
                        tracing::debug!("[SessionWatchdog] Session already watched");
                        continue;
                    }
                    tracing::debug!(rehydrated, "[SessionWatchdog] Session established");
                    stop(&shared, ticker.take()).await;
                    ticker = Some(begin(&shared, &shutdown));
                }
                Ok(SessionEvent::Cleared { reason }) => {
                    tracing::debug!(?reason, "[SessionWatchdog] Session cleared");
                    stop(&shared, ticker.take()).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "[SessionWatchdog] Missed session events, resyncing");
                    stop(&shared, ticker.take()).await;
                    if shared.session.is_authenticated() {
                        ticker = Some(begin(&shared, &shutdown));
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    stop(&shared, ticker.take()).await;
}

/// True if `ticker` already watches the credential the session holds now.
fn is_current(shared: &Shared, ticker: Option<&Ticker>) -> bool {
    match ticker {
        Some(ticker) => ticker.credential.is_some() && ticker.credential == shared.session.token(),
        None => false,
    }
}

/// Starts the expiry timer and one profile reconciliation for the session
/// that was just established.
fn begin(shared: &Arc<Shared>, shutdown: &CancellationToken) -> Ticker {
    let credential = shared.session.token();
    let token = shutdown.child_token();
    shared.ticking.store(true, Ordering::SeqCst);

    tokio::spawn(reconcile(shared.clone(), token.clone()));
    let handle = tokio::spawn(tick(shared.clone(), token.clone()));

    Ticker {
        credential,
        token,
        handle,
    }
}

async fn stop(shared: &Shared, ticker: Option<Ticker>) {
    let Some(ticker) = ticker else {
        return;
    };
    ticker.token.cancel();
    let _ = ticker.handle.await;
    shared.ticking.store(false, Ordering::SeqCst);
}

async fn tick(shared: Arc<Shared>, token: CancellationToken) {
    // The first tick completes immediately.
    let mut interval = tokio::time::interval(shared.interval);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                if shared.session.check_expiry() == ExpiryStatus::Expired {
                    tracing::info!("[SessionWatchdog] Session expired");
                    shared.teardown.session_ended(ClearReason::Expired);
                    break;
                }
            }
        }
    }
}

/// Fetches the live profile and folds it into the session.
///
/// An authorization failure while the same session is still considered
/// valid means the server no longer recognizes it. A fetcher backed by
/// `HttpTransport` never gets here with the session intact: the transport
/// clears it as `Unauthorized` on the 401 first, so the `Desync` branch only
/// fires for fetchers that bypass the transport.
async fn reconcile(shared: Arc<Shared>, token: CancellationToken) {
    let credential = shared.session.token();

    let result = tokio::select! {
        _ = token.cancelled() => return,
        result = shared.profile.fetch_profile() => result,
    };

    match result {
        Ok(profile) => {
            if shared.session.token() == credential {
                shared.session.update_user(profile);
                tracing::debug!("[SessionWatchdog] Profile reconciled");
            }
        }
        Err(e) if e.is_auth() => {
            let same_session =
                shared.session.is_authenticated() && shared.session.token() == credential;
            if same_session && shared.session.clear_session_with(ClearReason::Desync) {
                tracing::warn!("[SessionWatchdog] Server rejected a session the client considered valid");
                shared.teardown.session_ended(ClearReason::Desync);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "[SessionWatchdog] Profile reconciliation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResultCache;
    use crate::notification_center::NotificationCenter;
    use crate::teardown::{Navigation, SESSION_EXPIRED_MESSAGE, SESSION_REVOKED_MESSAGE};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use todosync_core::clock::ManualClock;
    use todosync_core::config::{CacheSettings, NotificationSettings};
    use todosync_core::session::InMemorySessionStore;
    use todosync_core::user::UserProfile;
    use todosync_core::{Result, TodoSyncError};

    struct FakeProfile {
        response: Result<UserProfile>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProfileFetcher for FakeProfile {
        async fn fetch_profile(&self) -> Result<UserProfile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    struct Harness {
        watchdog: SessionWatchdog,
        session: Arc<SessionManager>,
        clock: Arc<ManualClock>,
        center: Arc<NotificationCenter>,
        teardown: Arc<SessionTeardown>,
        profile: Arc<FakeProfile>,
    }

    fn harness(response: Result<UserProfile>) -> Harness {
        let clock = Arc::new(ManualClock::default());
        let session = Arc::new(SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            clock.clone(),
        ));
        let center = Arc::new(NotificationCenter::new(&NotificationSettings::default()));
        let cache = ResultCache::new(&CacheSettings::default(), clock.clone());
        let teardown = Arc::new(SessionTeardown::new(cache, center.clone()));
        let profile = Arc::new(FakeProfile {
            response,
            calls: AtomicUsize::new(0),
        });
        let watchdog = SessionWatchdog::new(
            session.clone(),
            profile.clone(),
            teardown.clone(),
            &SessionSettings::default(),
        );
        Harness {
            watchdog,
            session,
            clock,
            center,
            teardown,
            profile,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn alice() -> UserProfile {
        UserProfile::new().with("id", "u-1").with("username", "alice")
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_start_does_not_tick() {
        let h = harness(Ok(alice()));
        h.watchdog.start();
        settle().await;

        assert!(!h.watchdog.is_ticking());
        assert_eq!(h.profile.calls.load(Ordering::SeqCst), 0);
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_session_is_reconciled_and_ticks() {
        let h = harness(Ok(alice().with("is_active", true)));
        h.session.set_session("tok-1", Some(UserProfile::new().with("id", "u-1")));

        h.watchdog.start();
        settle().await;

        assert!(h.watchdog.is_ticking());
        assert_eq!(h.profile.calls.load(Ordering::SeqCst), 1);
        let user = h.session.user().unwrap();
        assert_eq!(user.username(), Some("alice"));
        assert_eq!(user.get("is_active"), Some(&serde_json::Value::Bool(true)));
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_detected_on_next_tick() {
        let h = harness(Ok(alice()));
        let mut nav = h.teardown.subscribe_navigation();
        h.watchdog.start();
        h.session.set_session("tok-1", None);
        settle().await;
        assert!(h.watchdog.is_ticking());

        h.clock.advance(chrono::Duration::hours(24));
        assert!(h.session.is_authenticated());

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(!h.session.is_authenticated());
        assert!(!h.watchdog.is_ticking());
        assert_eq!(h.center.current().unwrap().message, SESSION_EXPIRED_MESSAGE);
        assert_eq!(nav.try_recv().unwrap(), Navigation::Login);
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_cancels_timer_and_login_restarts_it() {
        let h = harness(Ok(alice()));
        h.watchdog.start();

        h.session.set_session("tok-1", None);
        settle().await;
        assert!(h.watchdog.is_ticking());

        h.session.clear_session();
        settle().await;
        assert!(!h.watchdog.is_ticking());

        h.session.set_session("tok-2", None);
        settle().await;
        assert!(h.watchdog.is_ticking());
        assert_eq!(h.profile.calls.load(Ordering::SeqCst), 2);
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_before_first_poll_is_reconciled_once() {
        let h = harness(Ok(alice()));
        h.watchdog.start();
        // Lands before the supervisor runs: both the state and the queued
        // event announce the same session.
        h.session.set_session("tok-1", None);
        settle().await;

        assert!(h.watchdog.is_ticking());
        assert_eq!(h.profile.calls.load(Ordering::SeqCst), 1);
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshed_token_is_reconciled_again() {
        let h = harness(Ok(alice()));
        h.session.set_session("tok-1", None);
        h.watchdog.start();
        settle().await;
        assert_eq!(h.profile.calls.load(Ordering::SeqCst), 1);

        h.session.replace_token("tok-2");
        settle().await;

        assert!(h.watchdog.is_ticking());
        assert_eq!(h.profile.calls.load(Ordering::SeqCst), 2);
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_while_authenticated_is_desync() {
        let h = harness(Err(TodoSyncError::auth("Token revoked")));
        let mut events = h.session.subscribe();
        h.watchdog.start();

        h.session.set_session("tok-1", Some(alice()));
        settle().await;

        assert!(!h.session.is_authenticated());
        assert!(!h.watchdog.is_ticking());
        assert_eq!(h.center.current().unwrap().message, SESSION_REVOKED_MESSAGE);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Established { rehydrated: false }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Cleared {
                reason: ClearReason::Desync
            }
        );
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_reconcile_failures_keep_session() {
        let h = harness(Err(TodoSyncError::network("offline")));
        h.watchdog.start();

        h.session.set_session("tok-1", Some(alice()));
        settle().await;

        assert!(h.session.is_authenticated());
        assert!(h.watchdog.is_ticking());
        assert!(h.center.current().is_none());
        h.watchdog.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timer() {
        let h = harness(Ok(alice()));
        h.session.set_session("tok-1", None);
        h.watchdog.start();
        settle().await;
        assert!(h.watchdog.is_ticking());

        h.watchdog.shutdown().await;

        assert!(!h.watchdog.is_ticking());
    }
}
