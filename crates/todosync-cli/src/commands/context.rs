use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use todosync_application::{AppContext, Navigation};
use todosync_core::clock::SystemClock;
use todosync_core::notification::NotificationKind;
use todosync_infrastructure::{ConfigService, FileSessionStore};

/// The application context plus where it was loaded from.
pub struct Loaded {
    pub ctx: AppContext,
    pub config_path: PathBuf,
    pub session_path: PathBuf,
}

pub fn load(config: Option<PathBuf>, session_file: Option<PathBuf>) -> Result<Loaded> {
    let config_service = match config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new().context("Failed to locate the config directory")?,
    };
    let config = config_service
        .get_config()
        .with_context(|| format!("Failed to load config from {}", config_service.path().display()))?;

    let store = match session_file {
        Some(path) => FileSessionStore::with_path(path),
        None => FileSessionStore::new().context("Failed to locate the data directory")?,
    };
    let session_path = store.path().to_path_buf();

    let ctx = AppContext::build(config, Arc::new(store), Arc::new(SystemClock))
        .context("Failed to initialize the client")?;

    Ok(Loaded {
        ctx,
        config_path: config_service.path().clone(),
        session_path,
    })
}

/// Prints what the user should see after a command: the last notification
/// and, if the session ended, how to get back in.
pub fn report(ctx: &AppContext, navigation: &mut broadcast::Receiver<Navigation>, succeeded: bool) {
    if succeeded {
        if let Some(notification) = ctx.notifications().current() {
            let icon = match notification.kind {
                NotificationKind::Success => "✅",
                NotificationKind::Error => "❌",
                NotificationKind::Warning => "⚠️",
                NotificationKind::Info => "ℹ️",
            };
            println!("{icon} {}", notification.message);
        }
    }

    let mut login_requested = false;
    while let Ok(Navigation::Login) = navigation.try_recv() {
        login_requested = true;
    }
    if login_requested {
        eprintln!("🔑 Run `todosync login` to sign in again.");
    }
}
