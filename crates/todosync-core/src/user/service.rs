//! Profile lookup service.

use super::model::UserProfile;
use crate::error::Result;

/// Fetches the profile of whoever the current credential belongs to.
///
/// The session watchdog uses this to reconcile the local session with the
/// server. The production implementation goes through the HTTP transport, so
/// it attaches the current bearer token like any other request.
#[async_trait::async_trait]
pub trait ProfileFetcher: Send + Sync {
    /// Returns the current user's profile.
    ///
    /// # Errors
    ///
    /// `TodoSyncError::Auth` when the server no longer accepts the credential.
    async fn fetch_profile(&self) -> Result<UserProfile>;
}
