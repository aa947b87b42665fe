//! File-backed session store.

use crate::paths::TodoSyncPaths;
use crate::storage::AtomicFile;
use std::path::{Path, PathBuf};
use todosync_core::Result;
use todosync_core::session::{SessionSnapshot, SessionStore};

/// Persists the session record as JSON under the data directory.
///
/// The record is written atomically and readable only by its owner. A
/// missing file reads as "nothing persisted"; a corrupt one is an error so
/// the session manager can discard it.
pub struct FileSessionStore {
    file: AtomicFile<SessionSnapshot>,
}

impl FileSessionStore {
    /// Creates a store at the default location
    /// (`<data_dir>/todosync/auth-storage.json`).
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(TodoSyncPaths::session_file()?))
    }

    /// Creates a store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicFile::json(path).private(),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.file.load()?)
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        tracing::debug!(path = %self.path().display(), "[FileSessionStore] Saving session");
        Ok(self.file.save(snapshot)?)
    }

    fn clear(&self) -> Result<()> {
        tracing::debug!(path = %self.path().display(), "[FileSessionStore] Clearing session");
        Ok(self.file.remove()?)
    }
}
