//! Client configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every field has a
//! default so a missing or partial file is always valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Root configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// REST backend connection settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Session watchdog settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// How often the watchdog re-checks session expiry.
    #[serde(default = "default_watchdog_interval_secs")]
    pub watchdog_interval_secs: u64,
}

impl SessionSettings {
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog_interval_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            watchdog_interval_secs: default_watchdog_interval_secs(),
        }
    }
}

fn default_watchdog_interval_secs() -> u64 {
    60
}

/// Result cache defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// How long a fetched value is considered fresh.
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
    /// How long an unobserved entry is retained after its last access.
    #[serde(default = "default_gc_time_secs")]
    pub gc_time_secs: u64,
    /// Extra attempts for a failed query (mutations never retry).
    #[serde(default = "default_query_retry")]
    pub query_retry: u32,
}

impl CacheSettings {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time_secs(),
            gc_time_secs: default_gc_time_secs(),
            query_retry: default_query_retry(),
        }
    }
}

fn default_stale_time_secs() -> u64 {
    5 * 60
}

fn default_gc_time_secs() -> u64 {
    10 * 60
}

fn default_query_retry() -> u32 {
    1
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NotificationSettings {
    #[serde(default = "default_display_secs")]
    pub display_secs: u64,
}

impl NotificationSettings {
    pub fn display_window(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            display_secs: default_display_secs(),
        }
    }
}

fn default_display_secs() -> u64 {
    5
}
