//! Wiring of the client's long-lived components.

use crate::auth_usecase::AuthUseCase;
use crate::cache::ResultCache;
use crate::notification_center::NotificationCenter;
use crate::teardown::{Navigation, SessionTeardown};
use crate::todo_usecase::TodoUseCase;
use crate::watchdog::SessionWatchdog;
use std::sync::Arc;
use tokio::sync::broadcast;
use todosync_core::Result;
use todosync_core::clock::Clock;
use todosync_core::config::ClientConfig;
use todosync_core::session::{RehydrateOutcome, SessionManager, SessionStore};
use todosync_interaction::{AuthApi, HttpTransport, TodoApi, UserApi};

/// Dependency-injection root.
///
/// Owns exactly one of each singleton: the session, the result cache and the
/// notification slot. Everything else receives them from here.
pub struct AppContext {
    config: ClientConfig,
    session: Arc<SessionManager>,
    cache: ResultCache,
    notifications: Arc<NotificationCenter>,
    teardown: Arc<SessionTeardown>,
    auth: AuthUseCase,
    todos: TodoUseCase,
    watchdog: SessionWatchdog,
}

impl AppContext {
    pub fn build(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let session = Arc::new(SessionManager::new(store, clock.clone()));
        let cache = ResultCache::new(&config.cache, clock);
        let notifications = Arc::new(NotificationCenter::new(&config.notifications));
        let teardown = Arc::new(SessionTeardown::new(cache.clone(), notifications.clone()));

        let transport = Arc::new(
            HttpTransport::new(&config.api, session.clone())?
                .with_unauthorized_handler(teardown.clone()),
        );
        let auth_api = AuthApi::new(transport.clone());
        let user_api = UserApi::new(transport.clone());
        let todo_api = TodoApi::new(transport);

        let auth = AuthUseCase::new(
            session.clone(),
            cache.clone(),
            notifications.clone(),
            auth_api,
            user_api.clone(),
        );
        let todos = TodoUseCase::new(todo_api, cache.clone(), notifications.clone());
        let watchdog = SessionWatchdog::new(
            session.clone(),
            Arc::new(user_api),
            teardown.clone(),
            &config.session,
        );

        tracing::debug!(base_url = %config.api.normalized_base_url(), "[AppContext] Built");
        Ok(Self {
            config,
            session,
            cache,
            notifications,
            teardown,
            auth,
            todos,
            watchdog,
        })
    }

    /// Restores the persisted session and starts the watchdog.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> RehydrateOutcome {
        let outcome = self.session.rehydrate();
        tracing::info!(?outcome, "[AppContext] Session rehydrated");
        self.watchdog.start();
        outcome
    }

    pub async fn shutdown(&self) {
        self.watchdog.shutdown().await;
    }

    pub fn subscribe_navigation(&self) -> broadcast::Receiver<Navigation> {
        self.teardown.subscribe_navigation()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn auth(&self) -> &AuthUseCase {
        &self.auth
    }

    pub fn todos(&self) -> &TodoUseCase {
        &self.todos
    }

    pub fn watchdog(&self) -> &SessionWatchdog {
        &self.watchdog
    }
}
