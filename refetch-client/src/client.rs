//! The caching, deduplicating HTTP client.

use std::sync::Arc;

use refetch_cache::{CacheConfig, CacheStore, PendingRequestRegistry, SharedResult};
use refetch_core::{ClientConfig, ClientError, Method, RequestFingerprint};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::metrics::{ClientMetrics, ResponseTimes};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Per-call options.
///
/// `cache` and `dedupe` default to on for reads and are ignored for writes.
/// `invalidate` lists path prefixes to drop from the cache after a
/// successful write.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub token: Option<String>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub cache: Option<bool>,
    pub dedupe: Option<bool>,
    pub invalidate: Vec<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying only a bearer token.
    pub fn authed(token: Option<&str>) -> Self {
        Self::new().with_token(token)
    }

    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    pub fn with_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe = Some(enabled);
        self
    }

    pub fn invalidating(mut self, prefix: impl Into<String>) -> Self {
        self.invalidate.push(prefix.into());
        self
    }
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    cache: Arc<CacheStore>,
    pending: Arc<PendingRequestRegistry>,
    response_times: ResponseTimes,
}

/// HTTP client shared by every binding.
///
/// Cheap to clone; clones share the transport, cache and registry.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<CacheStore>,
        pending: Arc<PendingRequestRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                cache,
                pending,
                response_times: ResponseTimes::new(),
            }),
        }
    }

    /// Build a client from configuration: a reqwest transport, a sweeping
    /// cache store and a fresh registry. Must run inside a tokio runtime.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::from_config(config)?;
        let cache = CacheStore::create(CacheConfig::from(&config.cache));
        tracing::info!(base_url = %config.api_base_url, "HTTP client configured");
        Ok(Self::new(
            Arc::new(transport),
            cache,
            Arc::new(PendingRequestRegistry::new()),
        ))
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.inner.cache
    }

    pub fn pending(&self) -> &Arc<PendingRequestRegistry> {
        &self.inner.pending
    }

    /// Issue one logical request.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Arc<Value>, ClientError> {
        if method.is_read() {
            self.read(method, path, options).await
        } else {
            self.write(method, path, options).await
        }
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Arc<Value>, ClientError> {
        self.request(Method::Get, path, options).await
    }

    /// GET and deserialize the body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let value = self.get(path, options).await?;
        decode(&value)
    }

    pub async fn post(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Arc<Value>, ClientError> {
        self.request(Method::Post, path, options.with_body(body)).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Arc<Value>, ClientError> {
        self.request(Method::Put, path, options.with_body(body)).await
    }

    pub async fn delete(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Arc<Value>, ClientError> {
        self.request(Method::Delete, path, options).await
    }

    /// Any method, with the body deserialized into `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let value = self.request(method, path, options).await?;
        decode(&value)
    }

    // === Cache surface ===

    pub fn cache_size(&self) -> usize {
        self.inner.cache.size()
    }

    pub fn cache_keys(&self) -> Vec<RequestFingerprint> {
        self.inner.cache.keys()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Drop the cached entry for `path` as seen by `token`.
    pub fn invalidate(&self, path: &str, token: Option<&str>) -> bool {
        self.inner
            .cache
            .delete(&RequestFingerprint::new(path, token))
    }

    // === Metrics ===

    pub fn metrics(&self) -> ClientMetrics {
        ClientMetrics::from_parts(
            &self.inner.cache.stats(),
            self.inner.cache.size(),
            self.inner.response_times.average(),
        )
    }

    pub fn reset_metrics(&self) {
        self.inner.cache.reset_stats();
        self.inner.response_times.clear();
    }

    async fn read(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Arc<Value>, ClientError> {
        let use_cache = options.cache.unwrap_or(true);
        let dedupe = options.dedupe.unwrap_or(true);
        let key = RequestFingerprint::new(path, options.token.as_deref());

        if use_cache {
            if let Some(value) = self.inner.cache.lookup(&key) {
                return Ok(value);
            }
        }

        let request = build_request(method, path, &options);
        let epoch = self.inner.cache.epoch();
        let fill = use_cache.then(|| (key.clone(), epoch));
        let inner = Arc::clone(&self.inner);

        if !dedupe {
            return execute(inner, request, fill).await;
        }

        let handle = self
            .inner
            .pending
            .begin_or_join(key.clone(), move || execute(inner, request, fill));
        let joined = handle.joined();
        let value = handle.await?;

        // The operation we joined may have been started with caching off.
        if use_cache && joined && self.inner.cache.get(&key).is_none() {
            self.inner.cache.set_if_unchanged(key, Arc::clone(&value), epoch);
        }
        Ok(value)
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Arc<Value>, ClientError> {
        let request = build_request(method, path, &options);
        let value = execute(Arc::clone(&self.inner), request, None).await?;

        for prefix in &options.invalidate {
            let removed = self.inner.cache.invalidate_prefix(prefix);
            let detached = self.inner.pending.forget_prefix(prefix);
            tracing::debug!(
                method = %method,
                path,
                prefix = %prefix,
                removed,
                detached,
                "Invalidated after write"
            );
        }
        Ok(value)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("cache", &self.inner.cache)
            .field("pending", &self.inner.pending)
            .finish()
    }
}

/// One network round trip, normalized. With `fill`, a success is cached
/// under the key unless the cache was invalidated after the epoch.
async fn execute(
    inner: Arc<ClientInner>,
    request: HttpRequest,
    fill: Option<(RequestFingerprint, u64)>,
) -> SharedResult {
    let method = request.method;
    let path = request.path.clone();

    let started = Instant::now();
    let outcome = inner.transport.send(request).await;
    inner.response_times.record(started.elapsed());

    let response = outcome.map_err(|err| {
        tracing::debug!(method = %method, path = %path, error = %err, "Transport failure");
        err
    })?;

    if !response.is_success() {
        let err = ClientError::from_status(response.status, response.json.as_ref());
        tracing::debug!(method = %method, path = %path, status = response.status, error = %err, "Request failed");
        return Err(err);
    }

    let value = Arc::new(response.json.unwrap_or(Value::Null));
    if let Some((key, epoch)) = fill {
        inner.cache.set_if_unchanged(key, Arc::clone(&value), epoch);
    }
    Ok(value)
}

fn build_request(method: Method, path: &str, options: &RequestOptions) -> HttpRequest {
    let mut request = HttpRequest::new(method, path);
    request
        .headers
        .push(("Content-Type".to_string(), "application/json".to_string()));
    if let Some(token) = options.token.as_deref().filter(|t| !t.is_empty()) {
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {}", token)));
    }
    request.headers.extend(options.headers.iter().cloned());
    if !method.is_read() {
        request.body = options.body.clone();
    }
    request
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ClientError> {
    T::deserialize(value).map_err(|e| ClientError::decode(e.to_string()))
}
