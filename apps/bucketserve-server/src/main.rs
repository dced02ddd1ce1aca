//! BucketServe - serve an S3 bucket as a static website.
//!
//! This binary wires the S3 object store client, the resolution engine, and
//! the file-serving HTTP service together, with an optional LRU/TTL
//! response cache in front.
//!
//! # Usage
//!
//! ```text
//! BUCKET=my-site LISTEN=0.0.0.0:8080 bucketserve-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BUCKET` | *(required)* | Bucket whose objects are served |
//! | `ENDPOINT` | *(unset)* | Store endpoint URL (MinIO etc.); unset means AWS |
//! | `ACCESS_KEY` / `SECRET_KEY` | *(unset)* | Static credentials; unset means the SDK default chain |
//! | `REGION` | `us-east-1` | Store region |
//! | `ROOT_PREFIX` | *(empty)* | Serve only the subtree under this key prefix |
//! | `LISTEN` | `127.0.0.1:8080` | Bind address |
//! | `CACHE_ENABLED` | `false` | Wrap the handler in the response cache |
//! | `CACHE_TTL_SECS` | `180` | Response cache TTL |
//! | `CACHE_CAPACITY` | `10000000` | Response cache budget in body bytes |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bucketserve_core::engine::ResolutionEngine;
use bucketserve_core::store::ObjectStore;
use bucketserve_core::ServeConfig;
use bucketserve_http::cache::{CacheConfig, CachedFileService};
use bucketserve_http::{FileBody, FileService};
use bucketserve_s3::S3ObjectStore;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<S>(listener: TcpListener, service: S) -> Result<()>
where
    S: hyper::service::Service<
            http::Request<Incoming>,
            Response = http::Response<FileBody>,
            Error = Infallible,
        > + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Build the cache configuration from the application config.
fn build_cache_config(config: &ServeConfig) -> CacheConfig {
    CacheConfig {
        capacity: config.cache_capacity,
        ttl: Duration::from_secs(config.cache_ttl_secs),
        ..CacheConfig::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServeConfig::from_env();

    init_tracing(&config.log_level)?;

    if config.bucket.trim().is_empty() {
        anyhow::bail!("bucket name cannot be empty, please set BUCKET=\"mybucket\"");
    }

    info!(
        bucket = %config.bucket,
        endpoint = %config.endpoint,
        root_prefix = %config.root_prefix,
        listen = %config.listen,
        cache_enabled = config.cache_enabled,
        version = VERSION,
        "starting BucketServe",
    );

    let store = S3ObjectStore::connect(&config).await?;
    let engine = ResolutionEngine::new(
        Arc::new(store) as Arc<dyn ObjectStore>,
        config.root_prefix.clone(),
    );
    let service = FileService::new(Arc::new(engine));

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    if config.cache_enabled {
        let cached = CachedFileService::new(service, build_cache_config(&config));
        serve(listener, cached).await
    } else {
        serve(listener, service).await
    }
}
