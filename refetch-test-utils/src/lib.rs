//! REFETCH Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted mock transport with call counting and request capture
//! - Proptest generators for paths and tokens
//! - Fixtures for clients and canned response bodies

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use refetch_cache::{CacheConfig, CacheStore, PendingRequestRegistry};
pub use refetch_client::{HttpClient, HttpRequest, HttpResponse, RequestOptions, Transport};
pub use refetch_core::{ClientError, Method, RequestFingerprint, TransportErrorKind};

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub result: Result<HttpResponse, ClientError>,
    pub delay: Duration,
}

impl MockResponse {
    /// 200 with a JSON body.
    pub fn ok(body: Value) -> Self {
        Self::status(200, Some(body))
    }

    pub fn status(status: u16, body: Option<Value>) -> Self {
        Self {
            result: Ok(HttpResponse::new(status, body)),
            delay: Duration::ZERO,
        }
    }

    /// Non-2xx with `{"error": message}` as the body.
    pub fn error(status: u16, message: &str) -> Self {
        Self::status(status, Some(json!({ "error": message })))
    }

    pub fn transport(kind: TransportErrorKind, message: &str) -> Self {
        Self {
            result: Err(ClientError::transport(kind, message)),
            delay: Duration::ZERO,
        }
    }

    /// Resolve only after `delay` (virtual time under a paused clock).
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn after_ms(self, millis: u64) -> Self {
        self.after(Duration::from_millis(millis))
    }
}

type Route = (Method, String);

/// Transport that replays scripted responses per `(method, path)`.
///
/// Responses queued for a route are consumed in order; the last one is
/// replayed for every further call. Unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<Route, VecDeque<MockResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
    total: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for `(method, path)`.
    pub fn respond(&self, method: Method, path: &str, response: MockResponse) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn respond_get(&self, path: &str, response: MockResponse) -> &Self {
        self.respond(Method::Get, path, response)
    }

    /// Number of calls made to `(method, path)`.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next_response(&self, method: Method, path: &str) -> MockResponse {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => MockResponse::error(404, &format!("no mock for {} {}", method, path)),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response(request.method, &request.path);
        self.requests.lock().unwrap().push(request);

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        response.result
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for request paths and tokens.

    use proptest::prelude::*;

    /// Paths like `/articles/ab12`.
    pub fn arb_path() -> impl Strategy<Value = String> {
        (
            prop_oneof![
                Just("articles"),
                Just("journals"),
                Just("notes"),
                Just("digests"),
                Just("calendar"),
            ],
            "[a-z0-9]{0,8}",
        )
            .prop_map(|(resource, id)| {
                if id.is_empty() {
                    format!("/{}", resource)
                } else {
                    format!("/{}/{}", resource, id)
                }
            })
    }

    /// Non-empty bearer tokens.
    pub fn arb_token() -> impl Strategy<Value = String> {
        "[A-Za-z0-9._-]{1,40}"
    }

    /// Two distinct tokens.
    pub fn arb_token_pair() -> impl Strategy<Value = (String, String)> {
        (arb_token(), arb_token()).prop_filter("tokens must differ", |(a, b)| a != b)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built clients and canned bodies.

    use super::*;

    /// Client over `transport` with a non-sweeping store using `ttl`.
    pub fn client_with_ttl(transport: Arc<MockTransport>, ttl: Duration) -> HttpClient {
        HttpClient::new(
            transport,
            Arc::new(CacheStore::new(CacheConfig::default().with_ttl(ttl))),
            Arc::new(PendingRequestRegistry::new()),
        )
    }

    /// Client with the default five-minute TTL.
    pub fn client(transport: Arc<MockTransport>) -> HttpClient {
        client_with_ttl(transport, CacheConfig::default().ttl)
    }

    pub fn article(id: u64, title: &str) -> Value {
        json!({
            "_id": id.to_string(),
            "title": title,
            "source": "wire",
            "tags": ["world"],
        })
    }

    pub fn article_page(page: u32, titles: &[&str]) -> Value {
        let items: Vec<Value> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| article(page as u64 * 100 + i as u64, title))
            .collect();
        json!({ "items": items, "page": page, "total": titles.len() })
    }

    pub fn digest(date: &str, headline: &str) -> Value {
        json!({ "date": date, "sections": [{ "headline": headline }] })
    }
}
