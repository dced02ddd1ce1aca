//! The LRU/TTL response cache middleware.
//!
//! [`CachedFileService`] is a decorator around the file service; the core
//! is agnostic to whether it is present. Only successful `GET` responses
//! whose declared length fits the per-entry cap are cached, keyed by path
//! plus query string. Entries expire after the configured TTL and are
//! evicted least-recently-used when the total body-byte budget is exceeded.
//!
//! A request carrying the refresh query key bypasses the cache and
//! repopulates the entry from the fresh response, which gives operators a
//! manual invalidation lever without restarting the process.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::body::FileBody;

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Total body-byte budget across all entries.
    pub capacity: usize,
    /// Time-to-live for each entry.
    pub ttl: Duration,
    /// Query parameter name that forces a bypass-and-refresh.
    pub refresh_key: String,
    /// Largest single response body that may be cached.
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000_000,
            ttl: Duration::from_secs(180),
            refresh_key: "opn".to_owned(),
            max_entry_size: 1_048_576,
        }
    }
}

/// One cached response: status, headers, and the buffered body.
#[derive(Debug, Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: http::HeaderMap,
    body: Bytes,
    stored_at: Instant,
}

/// LRU book-keeping guarded by one mutex; lookups and inserts are short.
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CachedResponse>,
    access_order: Vec<String>,
    total_bytes: usize,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            let key = self.access_order.remove(pos);
            self.access_order.push(key);
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.total_bytes -= entry.body.len();
        }
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
    }
}

/// Shared LRU/TTL store for cached responses.
#[derive(Debug)]
pub struct ResponseCache {
    state: Mutex<CacheState>,
    config: CacheConfig,
}

impl ResponseCache {
    /// Create a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            config,
        }
    }

    /// The cache configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a fresh entry, updating its recency. Expired entries are
    /// dropped and reported as misses.
    fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let mut state = self.state.lock();
        let expired = state
            .entries
            .get(key)
            .is_some_and(|e| e.stored_at.elapsed() > self.config.ttl);
        if expired {
            trace!(key, "cache entry expired");
            state.remove(key);
            return None;
        }
        let entry = state.entries.get(key).cloned()?;
        state.touch(key);
        Some(entry)
    }

    /// Insert an entry, evicting least-recently-used entries until the
    /// byte budget holds.
    fn insert(&self, key: String, entry: CachedResponse) {
        if entry.body.len() > self.config.max_entry_size {
            return;
        }

        let mut state = self.state.lock();
        state.remove(&key);
        state.total_bytes += entry.body.len();
        state.entries.insert(key.clone(), entry);
        state.access_order.push(key);

        while state.total_bytes > self.config.capacity && !state.access_order.is_empty() {
            let oldest = state.access_order.remove(0);
            if let Some(evicted) = state.entries.remove(&oldest) {
                state.total_bytes -= evicted.body.len();
                debug!(key = oldest, "evicted cache entry");
            }
        }
    }

    /// Drop an entry, if present.
    fn evict(&self, key: &str) {
        self.state.lock().remove(key);
    }
}

/// Derive the cache key from a request URI, reporting whether the refresh
/// key was present. The refresh parameter itself never becomes part of the
/// key, so a refresh repopulates the same entry ordinary requests hit.
fn cache_key(uri: &http::Uri, refresh_key: &str) -> (String, bool) {
    let path = uri.path();
    let mut refresh = false;
    let mut kept: Vec<&str> = Vec::new();

    if let Some(query) = uri.query() {
        for pair in query.split('&') {
            let name = pair.split('=').next().unwrap_or(pair);
            if name == refresh_key {
                refresh = true;
            } else if !pair.is_empty() {
                kept.push(pair);
            }
        }
    }

    let key = if kept.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{}", kept.join("&"))
    };
    (key, refresh)
}

/// Whether a response may be cached, judged before its body is consumed.
fn is_cacheable(parts: &http::response::Parts, max_entry_size: usize) -> bool {
    if parts.status != StatusCode::OK {
        return false;
    }
    parts
        .headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len <= max_entry_size)
}

/// Response-caching decorator around a file-serving service.
#[derive(Debug, Clone)]
pub struct CachedFileService<S> {
    inner: S,
    cache: Arc<ResponseCache>,
}

impl<S> CachedFileService<S> {
    /// Wrap `inner` with a cache built from `config`.
    #[must_use]
    pub fn new(inner: S, config: CacheConfig) -> Self {
        Self {
            inner,
            cache: Arc::new(ResponseCache::new(config)),
        }
    }

    /// The shared cache, for inspection.
    #[must_use]
    pub fn cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.cache)
    }
}

impl<S, B> hyper::service::Service<http::Request<B>> for CachedFileService<S>
where
    S: hyper::service::Service<
            http::Request<B>,
            Response = http::Response<FileBody>,
            Error = Infallible,
        > + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
    B: Send + 'static,
{
    type Response = http::Response<FileBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let cache = Arc::clone(&self.cache);

        Box::pin(async move {
            if req.method() != Method::GET {
                return inner.call(req).await;
            }

            let (key, refresh) = cache_key(req.uri(), &cache.config.refresh_key);
            if refresh {
                debug!(key, "refresh key present, bypassing cache");
                cache.evict(&key);
            } else if let Some(hit) = cache.lookup(&key) {
                trace!(key, "cache hit");
                return Ok(replay(hit, "hit"));
            }

            let response = match inner.call(req).await {
                Ok(response) => response,
                Err(never) => match never {},
            };

            let (mut parts, body) = response.into_parts();
            if !is_cacheable(&parts, cache.config.max_entry_size) {
                parts.headers.insert(
                    "x-cache",
                    http::header::HeaderValue::from_static("miss"),
                );
                return Ok(http::Response::from_parts(parts, body));
            }

            // Buffer the body so it can be replayed. The declared length is
            // already known to fit the entry cap.
            match body.collect().await {
                Ok(collected) => {
                    let bytes = collected.to_bytes();
                    let entry = CachedResponse {
                        status: parts.status,
                        headers: parts.headers.clone(),
                        body: bytes.clone(),
                        stored_at: Instant::now(),
                    };
                    cache.insert(key, entry);

                    parts.headers.insert(
                        "x-cache",
                        http::header::HeaderValue::from_static("miss"),
                    );
                    Ok(http::Response::from_parts(parts, FileBody::from_bytes(bytes)))
                }
                Err(err) => {
                    // The stream died while we buffered it; the client gets
                    // the failure instead of a truncated cached copy.
                    warn!(error = %err, "response stream failed during cache fill");
                    let resp = http::Response::builder()
                        .status(StatusCode::BAD_GATEWAY)
                        .body(FileBody::from_string("502 bad gateway\n"))
                        .expect("static response should be valid");
                    Ok(resp)
                }
            }
        })
    }
}

/// Rebuild a response from a cached entry.
fn replay(entry: CachedResponse, verdict: &'static str) -> http::Response<FileBody> {
    let mut response = http::Response::new(FileBody::from_bytes(entry.body));
    *response.status_mut() = entry.status;
    *response.headers_mut() = entry.headers;
    response
        .headers_mut()
        .insert("x-cache", http::header::HeaderValue::from_static(verdict));
    response
}
