//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the client configuration
//! from the configuration file (~/.config/todosync/config.toml) and applies
//! environment overrides on top of it.

use crate::paths::TodoSyncPaths;
use crate::storage::AtomicFile;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use todosync_core::config::ClientConfig;
use todosync_core::{Result, TodoSyncError};

/// Overrides `api.base_url`.
pub const ENV_API_BASE_URL: &str = "TODOSYNC_API_BASE_URL";
/// Overrides `api.timeout_secs`.
pub const ENV_API_TIMEOUT_SECS: &str = "TODOSYNC_API_TIMEOUT_SECS";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration service that loads and caches the client configuration.
///
/// A missing file yields the defaults. A file that exists but cannot be
/// parsed is an error: silently falling back would point the client at the
/// wrong backend.
#[derive(Clone)]
pub struct ConfigService {
    path: PathBuf,
    env: EnvLookup,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService for the default config file.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(TodoSyncPaths::config_file()?))
    }

    /// Creates a ConfigService for a custom config file.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            env: Arc::new(|key| std::env::var(key).ok()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Replaces the environment lookup (for testing).
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// Writes `config` to the config file and refreshes the cache.
    pub fn save_config(&self, config: &ClientConfig) -> Result<()> {
        AtomicFile::toml(self.path.clone()).save(config)?;
        self.invalidate_cache();
        Ok(())
    }

    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = AtomicFile::<ClientConfig>::toml(self.path.clone())
            .load()?
            .unwrap_or_else(|| {
                tracing::debug!(path = %self.path.display(), "[ConfigService] No config file, using defaults");
                ClientConfig::default()
            });

        self.apply_env_overrides(&mut config)?;
        tracing::debug!(base_url = %config.api.base_url, "[ConfigService] Configuration loaded");
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut ClientConfig) -> Result<()> {
        if let Some(base_url) = (self.env)(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.api.base_url = base_url.trim().to_string();
        }

        if let Some(raw) = (self.env)(ENV_API_TIMEOUT_SECS) {
            config.api.timeout_secs = raw.trim().parse().map_err(|_| {
                TodoSyncError::config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_API_TIMEOUT_SECS, raw
                ))
            })?;
        }

        Ok(())
    }
}
