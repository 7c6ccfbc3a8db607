//! Console facade: one session, one query cache, one API client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views talk to the backend only through `Console`. It keeps the session and
//! the cache consistent with each other: the cache is emptied whenever the
//! signed-in user changes, and a 401 from any read or write signs the user
//! out locally.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{CacheConfig, QueryCache, QueryKey};
use crate::config::ConsoleConfig;
use crate::error::{ApiError, ConfigError};
use crate::guard::{self, GuardDecision};
use crate::net::{ApiClient, HttpTransport, LoginRequest, Resource, Transport};
use crate::session::{AuthSession, LoginOutcome, Session};
use crate::storage::{CredentialStore, FileStore, KeyValueStore};

#[derive(Clone)]
pub struct Console {
    session: Arc<AuthSession>,
    cache: QueryCache,
    api: ApiClient,
}

impl Console {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, backend: Arc<dyn KeyValueStore>, cache: CacheConfig) -> Self {
        let credentials = CredentialStore::new(backend);
        let api = ApiClient::new(transport, credentials.clone());
        let session = Arc::new(AuthSession::new(api.clone(), credentials));
        let cache = QueryCache::new(api.clone(), cache);
        Self { session, cache, api }
    }

    /// Build a console talking HTTP to `config.api_url`, with credentials in
    /// a file at `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be built.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(&config.api_url, config.timeouts)?;
        let backend = FileStore::new(config.storage_path.clone());
        Ok(Self::new(Arc::new(transport), Arc::new(backend), config.cache))
    }

    #[must_use]
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Settle the session from storage. Call once at startup.
    pub fn init(&self) -> Session {
        self.session.check_auth()
    }

    pub async fn login(&self, credentials: &LoginRequest) -> LoginOutcome {
        let outcome = self.session.login(credentials).await;
        if outcome.success {
            self.cache.clear();
        }
        outcome
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        self.cache.clear();
    }

    #[must_use]
    pub fn guard(&self, path: &str) -> GuardDecision {
        guard::guard(&self.session.session(), path)
    }

    /// Cached read.
    ///
    /// # Errors
    ///
    /// Propagates the cache's `ApiError`. A 401 also signs the user out.
    pub async fn query(&self, key: &QueryKey) -> Result<Value, ApiError> {
        let result = self.cache.fetch(key).await;
        self.observe(result)
    }

    /// Uncached write that invalidates `invalidates` on success.
    ///
    /// # Errors
    ///
    /// Propagates the `ApiError`. A 401 also signs the user out.
    pub async fn mutate(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        invalidates: &[&str],
    ) -> Result<Value, ApiError> {
        let result = self.cache.mutate(method, endpoint, body, invalidates).await;
        self.observe(result)
    }

    /// # Errors
    ///
    /// See `query`.
    pub async fn list(&self, resource: Resource) -> Result<Value, ApiError> {
        self.query(&QueryKey::new(resource.collection_path())).await
    }

    /// # Errors
    ///
    /// See `query`.
    pub async fn show(&self, resource: Resource, id: &str) -> Result<Value, ApiError> {
        self.query(&QueryKey::new(resource.item_path(id))).await
    }

    /// # Errors
    ///
    /// See `mutate`.
    pub async fn create(&self, resource: Resource, body: Value) -> Result<Value, ApiError> {
        let collection = resource.collection_path();
        self.mutate(Method::POST, &collection, Some(body), &[&collection]).await
    }

    /// # Errors
    ///
    /// See `mutate`.
    pub async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Value, ApiError> {
        let collection = resource.collection_path();
        self.mutate(Method::PUT, &resource.item_path(id), Some(body), &[&collection]).await
    }

    /// # Errors
    ///
    /// See `mutate`.
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<Value, ApiError> {
        let collection = resource.collection_path();
        self.mutate(Method::DELETE, &resource.item_path(id), None, &[&collection]).await
    }

    fn observe(&self, result: Result<Value, ApiError>) -> Result<Value, ApiError> {
        if let Err(e) = &result
            && e.is_unauthorized()
            && self.session.session().is_authenticated
        {
            warn!(error = %e, "backend rejected the session; signing out");
            self.session.clear_auth();
            self.cache.clear();
            info!("local session cleared after 401");
        }
        result
    }
}

#[cfg(test)]
#[path = "console_test.rs"]
mod tests;
