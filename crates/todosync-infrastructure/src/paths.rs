//! Unified path management for todosync files.
//!
//! Configuration and session data live in the platform directories resolved
//! by the `dirs` crate (XDG on Linux, `Library/Application Support` on
//! macOS, `AppData` on Windows).

use std::path::PathBuf;

const APP_DIR: &str = "todosync";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for todosync_core::TodoSyncError {
    fn from(e: PathError) -> Self {
        todosync_core::TodoSyncError::config(e.to_string())
    }
}

/// Unified path management for todosync.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/todosync/          # Config directory
/// └── config.toml              # Client configuration
///
/// ~/.local/share/todosync/     # Data directory
/// └── auth-storage.json        # Persisted session record
/// ```
pub struct TodoSyncPaths;

impl TodoSyncPaths {
    /// Returns the todosync configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/todosync/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the todosync data directory.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted session record.
    ///
    /// # Security Note
    ///
    /// The file holds a bearer credential. [`crate::FileSessionStore`]
    /// restricts it to the owner on Unix systems.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join(Self::session_file_name()))
    }

    /// File name of the session record, derived from its storage key.
    pub fn session_file_name() -> String {
        format!("{}.json", todosync_core::session::SESSION_STORAGE_KEY)
    }
}
