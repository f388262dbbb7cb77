//! Session-aware HTTP client for the task/user API.
//!
//! # Design
//! `ApiClient` holds the fixed base address, a shared `SessionStore`, and a
//! `Transport`. Every call goes through the same three steps:
//! `build_request` (endpoint + headers + JSON body), `Transport::execute`,
//! and `parse_response` (status classification + JSON decode). The build and
//! parse halves are public and free of I/O, so they can be checked without
//! a server.
//!
//! The client reads the token when a request is built and never writes
//! session state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::session::SessionStore;

/// Whether a request may carry the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Attach `Authorization: Bearer <token>` when the session holds one.
    Session,
    /// Never attach credentials (login).
    Anonymous,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Serialize a request payload.
pub fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        if path.contains("://") || !path.starts_with('/') {
            return Err(ApiError::InvalidPath(path.to_string()));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Build a fully qualified request for the server-relative `path`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        auth: Auth,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(path)?;

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if auth == Auth::Session {
            if let Some(token) = self.session.get_token() {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Classify the status and decode the body.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `()` and `Option<T>`
    /// targets yield an absence value rather than a parse error.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        if !response.is_success() {
            let message = if response.body.trim().is_empty() {
                format!("HTTP error! status: {}", response.status)
            } else {
                response.body
            };
            return Err(ApiError::Request {
                status: response.status,
                message,
            });
        }

        let body = response.body.trim();
        let body = if body.is_empty() { "null" } else { body };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Execute a built request and parse its response.
    pub async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            authorized = request.header("authorization").is_some(),
            "sending request"
        );
        let response = self.transport.execute(request).await?;
        tracing::debug!(status = response.status, "received response");
        self.parse_response(response)
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let request = self.build_request(method, path, body, auth)?;
        self.send(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(HttpMethod::Get, path, None, Auth::Session).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        self.request(HttpMethod::Post, path, Some(body), Auth::Session).await
    }

    /// POST without credentials, whatever the session state.
    pub async fn post_anonymous<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        self.request(HttpMethod::Post, path, Some(body), Auth::Anonymous).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        self.request(HttpMethod::Put, path, Some(body), Auth::Session).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(HttpMethod::Delete, path, None, Auth::Session).await
    }
}
