//! Single-slot notification center.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use todosync_core::config::NotificationSettings;
use todosync_core::notification::{Notification, NotificationId, NotificationKind, Notifier};

/// Holds at most one notification at a time.
///
/// A new notification replaces the current one. Each notification hides
/// itself after the display window unless it was replaced or dismissed
/// first. Consumers watch the slot through [`NotificationCenter::subscribe`].
pub struct NotificationCenter {
    slot: Arc<watch::Sender<Option<Notification>>>,
    next_id: AtomicU64,
    display_window: Duration,
}

impl NotificationCenter {
    pub fn new(settings: &NotificationSettings) -> Self {
        Self::with_display_window(settings.display_window())
    }

    pub fn with_display_window(display_window: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            next_id: AtomicU64::new(1),
            display_window,
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.slot.subscribe()
    }

    /// Hides the current notification.
    pub fn dismiss(&self) {
        self.slot.send_if_modified(|current| current.take().is_some());
    }

    fn schedule_hide(&self, id: NotificationId) {
        let slot = self.slot.clone();
        let window = self.display_window;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(window).await;
                    hide_if_current(&slot, id);
                });
            }
            Err(_) => {
                tracing::debug!(id, "[NotificationCenter] No runtime, notification stays until dismissed");
            }
        }
    }
}

fn hide_if_current(slot: &watch::Sender<Option<Notification>>, id: NotificationId) {
    slot.send_if_modified(|current| match current {
        Some(shown) if shown.id == id => {
            *current = None;
            true
        }
        _ => false,
    });
}

impl Notifier for NotificationCenter {
    fn notify(&self, message: &str, kind: NotificationKind) -> NotificationId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, %kind, message, "[NotificationCenter] Showing notification");

        self.slot.send_replace(Some(Notification {
            id,
            message: message.to_string(),
            kind,
        }));
        self.schedule_hide(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center() -> NotificationCenter {
        NotificationCenter::new(&NotificationSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_hides_after_window() {
        let center = center();
        let id = center.notify("Saved", NotificationKind::Success);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(center.current().map(|n| n.id), Some(id));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(center.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_notification_replaces_and_outlives_older_timer() {
        let center = center();
        center.notify("first", NotificationKind::Info);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let second = center.notify("second", NotificationKind::Error);
        assert_eq!(center.current().unwrap().message, "second");

        // The first notification's timer fires at 5s and must not hide the second.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(center.current().map(|n| n.id), Some(second));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(center.current().is_none());
    }

    #[tokio::test]
    async fn test_dismiss_and_subscribe() {
        let center = center();
        let mut rx = center.subscribe();

        center.error("boom");
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|n| n.kind),
            Some(NotificationKind::Error)
        );

        center.dismiss();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());

        center.dismiss();
        assert!(!rx.has_changed().unwrap());
    }
}
