//! Client for the `/api/auth` endpoints.

use crate::transport::HttpTransport;
use std::sync::Arc;
use todosync_core::Result;
use todosync_core::user::{Credentials, TokenResponse, UserProfile};

#[derive(Clone)]
pub struct AuthApi {
    transport: Arc<HttpTransport>,
}

impl AuthApi {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// Creates an account. Does not log in.
    pub async fn register(&self, credentials: &Credentials) -> Result<UserProfile> {
        self.transport.post("/api/auth/register", credentials).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.transport.post("/api/auth/login", credentials).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.transport.post_empty("/api/auth/logout").await
    }

    /// Exchanges the current credential for a fresh one.
    pub async fn refresh(&self) -> Result<TokenResponse> {
        self.transport.post_for("/api/auth/refresh").await
    }
}
