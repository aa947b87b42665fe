//! Client-side teardown after the server or the clock ended a session.

use crate::cache::ResultCache;
use std::sync::Arc;
use tokio::sync::broadcast;
use todosync_core::hook::UnauthorizedHandler;
use todosync_core::notification::Notifier;
use todosync_core::session::ClearReason;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const SESSION_REVOKED_MESSAGE: &str = "Your session is no longer valid. Please log in again.";

/// Where the front end should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Back to the unauthenticated entry point.
    Login,
}

/// Purges client state derived from a session that no longer exists.
pub struct SessionTeardown {
    cache: ResultCache,
    notifier: Arc<dyn Notifier>,
    navigation: broadcast::Sender<Navigation>,
}

impl SessionTeardown {
    pub fn new(cache: ResultCache, notifier: Arc<dyn Notifier>) -> Self {
        let (navigation, _) = broadcast::channel(16);
        Self {
            cache,
            notifier,
            navigation,
        }
    }

    pub fn subscribe_navigation(&self) -> broadcast::Receiver<Navigation> {
        self.navigation.subscribe()
    }

    /// Runs after the session manager cleared the session for `reason`.
    ///
    /// Explicit logout and account deletion are driven by their own use
    /// cases and only purge the cache here.
    pub fn session_ended(&self, reason: ClearReason) {
        self.cache.clear();
        match reason {
            ClearReason::Expired | ClearReason::Unauthorized => {
                self.notifier.error(SESSION_EXPIRED_MESSAGE);
                self.request_login();
            }
            ClearReason::Desync => {
                self.notifier.error(SESSION_REVOKED_MESSAGE);
                self.request_login();
            }
            ClearReason::Logout | ClearReason::AccountDeleted => {}
        }
    }

    fn request_login(&self) {
        // No receivers is fine: a headless caller is not navigating anywhere.
        let _ = self.navigation.send(Navigation::Login);
    }
}

impl UnauthorizedHandler for SessionTeardown {
    fn on_unauthorized(&self, cleared: bool) {
        if cleared {
            self.session_ended(ClearReason::Unauthorized);
        } else {
            self.cache.clear();
            self.request_login();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{QueryKey, QueryOptions};
    use crate::notification_center::NotificationCenter;
    use todosync_core::clock::ManualClock;
    use todosync_core::config::{CacheSettings, NotificationSettings};
    use todosync_core::{Result, TodoSyncError};

    async fn populated_cache() -> ResultCache {
        let cache = ResultCache::new(&CacheSettings::default(), Arc::new(ManualClock::default()));
        cache
            .query(
                QueryKey::root().name("user"),
                || async { Ok::<_, TodoSyncError>(1u8) },
                QueryOptions::default(),
            )
            .await
            .unwrap();
        cache
    }

    #[tokio::test]
    async fn test_unauthorized_with_cleared_session_notifies_and_navigates() -> Result<()> {
        let cache = populated_cache().await;
        let center = Arc::new(NotificationCenter::new(&NotificationSettings::default()));
        let teardown = SessionTeardown::new(cache.clone(), center.clone());
        let mut nav = teardown.subscribe_navigation();

        teardown.on_unauthorized(true);
        teardown.on_unauthorized(false);

        assert!(cache.is_empty());
        assert_eq!(center.current().unwrap().message, SESSION_EXPIRED_MESSAGE);
        assert_eq!(nav.try_recv().unwrap(), Navigation::Login);
        assert_eq!(nav.try_recv().unwrap(), Navigation::Login);
        assert_eq!(center.current().unwrap().id, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unauthorized_without_session_stays_quiet() {
        let cache = populated_cache().await;
        let center = Arc::new(NotificationCenter::new(&NotificationSettings::default()));
        let teardown = SessionTeardown::new(cache.clone(), center.clone());

        teardown.on_unauthorized(false);

        assert!(cache.is_empty());
        assert!(center.current().is_none());
    }

    #[tokio::test]
    async fn test_logout_only_purges_cache() {
        let cache = populated_cache().await;
        let center = Arc::new(NotificationCenter::new(&NotificationSettings::default()));
        let teardown = SessionTeardown::new(cache.clone(), center.clone());
        let mut nav = teardown.subscribe_navigation();

        teardown.session_ended(ClearReason::Logout);

        assert!(cache.is_empty());
        assert!(center.current().is_none());
        assert!(nav.try_recv().is_err());
    }
}
