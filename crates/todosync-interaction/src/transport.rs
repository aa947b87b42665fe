//! HTTP transport for the todo REST backend.
//!
//! Every request goes through [`HttpTransport`], which attaches the current
//! bearer credential at send time and normalizes every failure into a
//! [`TodoSyncError`]. A 401 response additionally tears down the session
//! through the installed [`UnauthorizedHandler`].

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use todosync_core::config::ApiSettings;
use todosync_core::hook::{NoopUnauthorizedHandler, UnauthorizedHandler};
use todosync_core::session::{ClearReason, SessionManager};
use todosync_core::{Result, TodoSyncError};

/// Shared HTTP client bound to one backend and one session.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
    on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl HttpTransport {
    /// Creates a transport for `settings.base_url` with the configured
    /// timeout and JSON content type.
    pub fn new(settings: &ApiSettings, session: Arc<SessionManager>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(settings.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| TodoSyncError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.normalized_base_url().to_string(),
            session,
            on_unauthorized: Arc::new(NoopUnauthorizedHandler),
        })
    }

    /// Installs the handler invoked after every 401.
    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.on_unauthorized = handler;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ============================================================================
    // Typed helpers
    // ============================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .send(self.request(Method::GET, path).query(query))
            .await?;
        decode(response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        decode(response).await
    }

    /// POST without a body. Any success status is accepted and the response
    /// body is ignored.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::POST, path)).await?;
        Ok(())
    }

    /// POST without a body whose response carries a payload.
    pub async fn post_for<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::POST, path)).await?;
        decode(response).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    pub async fn delete_with_body<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::DELETE, path).json(body))
            .await?;
        Ok(())
    }

    // ============================================================================
    // Core send path
    // ============================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client.request(method, url)
    }

    /// Makes an authenticated request.
    ///
    /// The token is read from the session manager now, not when the request
    /// was built, so a request never carries a credential that was already
    /// cleared.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_status(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            let cleared = self.session.clear_session_with(ClearReason::Unauthorized);
            tracing::warn!(cleared, "[HttpTransport] Request unauthorized, session torn down");
            self.on_unauthorized.on_unauthorized(cleared);
        } else {
            tracing::debug!(status = status.as_u16(), error = %error, "[HttpTransport] Request failed");
        }

        Err(error)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await.map_err(map_send_error)?;
    serde_json::from_str(&body).map_err(|e| TodoSyncError::Serialization {
        format: "JSON".to_string(),
        message: format!("Unexpected response body: {e}"),
    })
}

fn map_send_error(err: reqwest::Error) -> TodoSyncError {
    if err.is_timeout() {
        TodoSyncError::network("Request timed out. Please check your connection.")
    } else if err.is_connect() {
        TodoSyncError::network("Network error. Please check your connection.")
    } else {
        TodoSyncError::network(format!("Request failed: {err}"))
    }
}

/// Maps a non-success response to the error taxonomy.
///
/// The message comes from the body's `detail` (string, or FastAPI's list of
/// validation issues) or `message` field, falling back to a default for the
/// status class.
pub fn classify_status(status: StatusCode, body: &str) -> TodoSyncError {
    let extracted = extract_message(body);
    let message = |default: &str| extracted.clone().unwrap_or_else(|| default.to_string());

    match status {
        StatusCode::UNAUTHORIZED => TodoSyncError::Auth {
            message: message("Not authenticated"),
        },
        StatusCode::FORBIDDEN => TodoSyncError::Forbidden {
            message: message("Access denied"),
        },
        StatusCode::NOT_FOUND => TodoSyncError::NotFound {
            message: message("Resource not found"),
        },
        s if s.is_server_error() => TodoSyncError::Server {
            status: s.as_u16(),
            message: message("Server error. Please try again later."),
        },
        s => TodoSyncError::Request {
            status: s.as_u16(),
            message: message("An error occurred"),
        },
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(issues)) => {
            let joined = issues
                .iter()
                .filter_map(|issue| match issue {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
