//! API client: every request goes out with the stored bearer token.
//!
//! ERROR HANDLING
//! ==============
//! The client never retries and never touches the session. Callers decide
//! what a failure means (the query cache retries, the console facade signs
//! out on 401).

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::types::{LoginGrant, LoginRequest, decode_login};
use crate::error::ApiError;
use crate::storage::CredentialStore;

pub const LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const LOGOUT_ENDPOINT: &str = "/api/auth/logout";

/// A fully-resolved outgoing request, handed to a `Transport`.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the backend base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

/// Sends requests to the backend and normalizes the response.
///
/// Implementations return the decoded JSON body on 2xx (`Value::Null` for an
/// empty body) and `ApiError` otherwise.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, credentials: CredentialStore) -> Self {
        Self { transport, credentials }
    }

    /// Issue a request with the current access token attached.
    ///
    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let bearer = self.credentials.access_token();
        debug!(%method, path, authenticated = bearer.is_some(), "api request");
        let request = ApiRequest { method, path: path.to_owned(), query: query.to_vec(), body, bearer };
        self.transport.send(request).await
    }

    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, &[], Some(body)).await
    }

    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    /// `POST /api/auth/login`, decoded into a complete `LoginGrant`.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `ApiError::MalformedResponse` when the
    /// response lacks a token or user.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginGrant, ApiError> {
        let body = serde_json::to_value(credentials).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.post(LOGIN_ENDPOINT, body).await?;
        decode_login(response)
    }

    /// `POST /api/auth/logout`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Propagates the transport's `ApiError`.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.request(Method::POST, LOGOUT_ENDPOINT, &[], None)
            .await
            .map(|_| ())
    }
}
