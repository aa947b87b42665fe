//! Client for the `/api/users/me` endpoints.

use crate::transport::HttpTransport;
use async_trait::async_trait;
use std::sync::Arc;
use todosync_core::Result;
use todosync_core::user::{AccountDeletion, ProfileFetcher, ProfileUpdate, UserProfile};

const ME: &str = "/api/users/me";

#[derive(Clone)]
pub struct UserApi {
    transport: Arc<HttpTransport>,
}

impl UserApi {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.transport.get(ME).await
    }

    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.transport.put(ME, update).await
    }

    pub async fn delete_me(&self, deletion: &AccountDeletion) -> Result<()> {
        self.transport.delete_with_body(ME, deletion).await
    }
}

#[async_trait]
impl ProfileFetcher for UserApi {
    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.me().await
    }
}
