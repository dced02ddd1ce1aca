//! The S3-backed [`ObjectStore`] implementation.
//!
//! Probing maps to `HeadObject`, streaming to `GetObject` with a `Range`
//! header, a forward stream from the requested offset to the end of the
//! object. Seeks above this layer are realized by dropping a stream and
//! opening a new one, so no store-side random access is needed.
//!
//! Connection pooling, keep-alive, and per-connection timeouts are the SDK
//! transport's responsibility and are configured once when the client is
//! built; the client is safe for concurrent use by many requests.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use bucketserve_core::config::ServeConfig;
use bucketserve_core::error::StoreError;
use bucketserve_core::store::{ObjectMeta, ObjectReader, ObjectStore};

/// Read-only S3 client bound to one bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from startup configuration.
    ///
    /// Static keys take precedence when both are configured; otherwise the
    /// SDK's default credential chain applies (environment variables, the
    /// shared credentials file, IMDS on EC2). A non-empty endpoint switches
    /// the client to path-style addressing, which is what MinIO and other
    /// self-hosted stores expect.
    pub async fn connect(config: &ServeConfig) -> anyhow::Result<Self> {
        if config.bucket.trim().is_empty() {
            anyhow::bail!("bucket name cannot be empty");
        }

        let region = Region::new(config.region.clone());
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        if !config.access_key.is_empty() && !config.secret_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "static",
            ));
        }

        let base = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if !config.endpoint.is_empty() {
            builder = builder
                .endpoint_url(config.endpoint.clone())
                .force_path_style(true);
        }

        info!(
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            region = %config.region,
            "connected S3 object store"
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an already-built SDK client.
    #[must_use]
    pub fn from_client(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// The bucket this store serves from.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// `Range` header value for a forward stream starting at `start`.
fn range_for(start: u64) -> Option<String> {
    (start > 0).then(|| format!("bytes={start}-"))
}

/// Convert an SDK timestamp into the core's mod-time representation.
fn to_mod_time(dt: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    dt.and_then(|t| {
        DateTime::from_timestamp(t.secs(), t.subsec_nanos())
    })
    .unwrap_or_else(Utc::now)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn probe(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(head) => {
                let size = head.content_length().unwrap_or(0).max(0);
                debug!(key, size, "probed object");
                Ok(ObjectMeta {
                    size: size.unsigned_abs(),
                    mod_time: to_mod_time(head.last_modified()),
                })
            }
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_not_found() => {
                Err(StoreError::not_found(key))
            }
            Err(err) => Err(StoreError::transport(DisplayErrorContext(&err))),
        }
    }

    async fn open_stream(&self, key: &str, start: u64) -> Result<ObjectReader, StoreError> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(range) = range_for(start) {
            request = request.range(range);
        }

        let result = request.send().await;
        match result {
            Ok(output) => {
                debug!(key, start, "opened object stream");
                Ok(Box::pin(output.body.into_async_read()))
            }
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_no_such_key() => {
                Err(StoreError::not_found(key))
            }
            Err(err) => Err(StoreError::transport(DisplayErrorContext(&err))),
        }
    }
}
