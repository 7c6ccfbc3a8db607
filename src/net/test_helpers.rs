//! Scripted `Transport` for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};

use super::client::{ApiClient, ApiRequest, Transport};
use crate::error::ApiError;
use crate::storage::{CredentialStore, MemoryStore};

type Route = (Method, String);

/// Replays queued responses per `(method, path)`. The last queued response
/// for a route repeats forever; unknown routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<Route, VecDeque<Result<Value, ApiError>>>>,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, so concurrent callers overlap.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    pub fn respond(&self, method: Method, path: &str, result: Result<Value, ApiError>) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(result);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let route = (request.method.clone(), request.path.clone());
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ApiError::Status { status: 404, message: "Not Found".into() }),
        }
    }
}

pub struct Fixture {
    pub transport: Arc<MockTransport>,
    pub backend: Arc<MemoryStore>,
    pub credentials: CredentialStore,
    pub api: ApiClient,
}

pub fn fixture() -> Fixture {
    fixture_with(MockTransport::new())
}

pub fn fixture_with(transport: MockTransport) -> Fixture {
    let transport = Arc::new(transport);
    let backend = Arc::new(MemoryStore::new());
    let credentials = CredentialStore::new(backend.clone());
    let api = ApiClient::new(transport.clone(), credentials.clone());
    Fixture { transport, backend, credentials, api }
}

pub fn admin_login_body(token: &str) -> Value {
    json!({ "accessToken": token, "user": { "id": "1", "role": "admin" } })
}
