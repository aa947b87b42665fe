//! Authentication and account use cases.

use crate::cache::{QueryKey, ResultCache, auth_keys};
use std::sync::Arc;
use todosync_core::notification::Notifier;
use todosync_core::session::{ClearReason, SessionManager};
use todosync_core::user::{AccountDeletion, Credentials, ProfileUpdate, UserProfile};
use todosync_core::{Result, TodoSyncError};
use todosync_interaction::{AuthApi, UserApi};

/// Coordinates the auth endpoints with the session and the result cache.
///
/// # Responsibilities
///
/// - Establishing and ending the session around login, logout and account deletion
/// - Keeping cached user queries consistent with profile mutations
/// - Reporting outcomes through the notifier
pub struct AuthUseCase {
    session: Arc<SessionManager>,
    cache: ResultCache,
    notifier: Arc<dyn Notifier>,
    auth_api: AuthApi,
    user_api: UserApi,
}

impl AuthUseCase {
    pub fn new(
        session: Arc<SessionManager>,
        cache: ResultCache,
        notifier: Arc<dyn Notifier>,
        auth_api: AuthApi,
        user_api: UserApi,
    ) -> Self {
        Self {
            session,
            cache,
            notifier,
            auth_api,
            user_api,
        }
    }

    /// Creates an account. The caller still has to log in.
    pub async fn register(&self, credentials: &Credentials) -> Result<UserProfile> {
        credentials.validate()?;
        let profile = self.report(self.auth_api.register(credentials).await)?;
        self.notifier.success("Registration successful! Please log in.");
        Ok(profile)
    }

    /// Logs in and marks every cached query stale so it refetches under the
    /// new credential.
    pub async fn login(&self, credentials: &Credentials) -> Result<Option<UserProfile>> {
        credentials.validate()?;
        let token = self.report(self.auth_api.login(credentials).await)?;

        self.session.set_session(token.access_token, token.user.clone());
        self.cache.invalidate(&QueryKey::root());

        tracing::info!(username = %credentials.username, "[AuthUseCase] Logged in");
        self.notifier.success("Login successful!");
        Ok(token.user)
    }

    /// Ends the session locally whether or not the server acknowledged it.
    ///
    /// Returns `true` if the server acknowledged the logout.
    pub async fn logout(&self) -> bool {
        let acknowledged = match self.auth_api.logout().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "[AuthUseCase] Logout request failed, logging out locally");
                false
            }
        };

        self.session.clear_session_with(ClearReason::Logout);
        self.cache.clear();
        acknowledged
    }

    /// Exchanges the current credential for a fresh one.
    pub async fn refresh(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            return Err(TodoSyncError::auth("Not logged in"));
        }
        let token = self.report(self.auth_api.refresh().await)?;

        self.session.replace_token(token.access_token);
        if let Some(user) = token.user {
            self.session.update_user(user);
        }
        tracing::info!("[AuthUseCase] Token refreshed");
        Ok(())
    }

    /// The current user's profile, served from the cache.
    ///
    /// Never retried: a rejected credential will not become valid by asking
    /// again.
    pub async fn profile(&self) -> Result<UserProfile> {
        if !self.session.is_authenticated() {
            return Err(TodoSyncError::auth("Not logged in"));
        }

        let api = self.user_api.clone();
        self.cache
            .query(
                auth_keys::profile(),
                move || {
                    let api = api.clone();
                    async move { api.me().await }
                },
                self.cache.default_options().with_retry(0),
            )
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        update.validate()?;
        let profile = self.report(self.user_api.update_me(update).await)?;

        self.session.update_user(profile.clone());
        self.cache.invalidate(&auth_keys::user());
        self.notifier.success("Profile updated successfully");
        Ok(profile)
    }

    pub async fn delete_account(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(TodoSyncError::validation("Password is required"));
        }
        let deletion = AccountDeletion {
            password: password.to_string(),
        };
        self.report(self.user_api.delete_me(&deletion).await)?;

        self.session.clear_session_with(ClearReason::AccountDeleted);
        self.cache.clear();
        self.notifier.success("Account deleted");
        Ok(())
    }

    /// Shows a failed request to the user. Authorization failures are left
    /// to the session teardown.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_auth() {
                self.notifier.error(&user_message(e));
            }
        }
        result
    }
}

/// Text shown to the user for a failed operation.
pub(crate) fn user_message(error: &TodoSyncError) -> String {
    match error {
        TodoSyncError::Network { message }
        | TodoSyncError::Auth { message }
        | TodoSyncError::Forbidden { message }
        | TodoSyncError::NotFound { message }
        | TodoSyncError::Server { message, .. }
        | TodoSyncError::Request { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
