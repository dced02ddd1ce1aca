//! Integration tests for the BucketServe server.
//!
//! Each test spins up the composed hyper service in-process on an ephemeral
//! port, backed by the in-memory store, and drives it over real HTTP with
//! `reqwest`. No external object store is required.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;

use bucketserve_core::engine::ResolutionEngine;
use bucketserve_core::store::{MemoryStore, ObjectStore};
use bucketserve_http::cache::{CacheConfig, CachedFileService};
use bucketserve_http::{FileBody, FileService};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A live test site: the backing store plus the server's base URL.
#[derive(Debug)]
pub struct TestSite {
    /// The in-memory store backing the server. Mutate it to stage fixtures.
    pub store: Arc<MemoryStore>,
    /// Base URL of the form `http://127.0.0.1:{port}`.
    pub base_url: String,
}

impl TestSite {
    /// Absolute URL for a request path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Spawn an accept loop serving `service` on `listener`.
fn spawn_accept_loop<S>(listener: TcpListener, service: S)
where
    S: hyper::service::Service<
            http::Request<hyper::body::Incoming>,
            Response = http::Response<FileBody>,
            Error = Infallible,
        > + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let svc = service.clone();
            tokio::spawn(async move {
                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });
}

async fn bind_ephemeral() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("failed to bind test listener: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("failed to read local addr: {e}"));
    (listener, addr)
}

/// Start a server over an empty in-memory store with the given root prefix.
pub async fn serve_site(root_prefix: &str) -> TestSite {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let engine = ResolutionEngine::new(Arc::clone(&store) as Arc<dyn ObjectStore>, root_prefix);
    let service = FileService::new(Arc::new(engine));

    let (listener, addr) = bind_ephemeral().await;
    spawn_accept_loop(listener, service);

    TestSite {
        store,
        base_url: format!("http://{addr}"),
    }
}

/// Start a server with the response cache middleware in front.
pub async fn serve_cached_site(root_prefix: &str, cache: CacheConfig) -> TestSite {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let engine = ResolutionEngine::new(Arc::clone(&store) as Arc<dyn ObjectStore>, root_prefix);
    let service = CachedFileService::new(FileService::new(Arc::new(engine)), cache);

    let (listener, addr) = bind_ephemeral().await;
    spawn_accept_loop(listener, service);

    TestSite {
        store,
        base_url: format!("http://{addr}"),
    }
}

/// HTTP client for the tests.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

mod test_cache;
mod test_directory;
mod test_range;
mod test_resolution;
