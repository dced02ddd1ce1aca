//! Configuration for BucketServe.
//!
//! All configuration is read once at startup from environment variables and
//! passed explicitly into constructors; nothing in the core reads ambient
//! global state after that.

/// Global configuration for a BucketServe process.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeConfig {
    /// Object store endpoint URL. Empty means the SDK default (AWS).
    pub endpoint: String,
    /// Static access key. Empty means use the default credential chain.
    pub access_key: String,
    /// Static secret key. Empty means use the default credential chain.
    pub secret_key: String,
    /// Region hint for the store client.
    pub region: String,
    /// Bucket whose objects are served.
    pub bucket: String,
    /// Root prefix restricting the served subtree. Empty serves the whole
    /// bucket.
    pub root_prefix: String,
    /// Bind address for the HTTP listener.
    pub listen: String,
    /// Whether the response cache middleware wraps the handler.
    pub cache_enabled: bool,
    /// Response cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Response cache capacity in total body bytes.
    pub cache_capacity: usize,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".to_owned(),
            bucket: String::new(),
            root_prefix: String::new(),
            listen: "127.0.0.1:8080".to_owned(),
            cache_enabled: false,
            cache_ttl_secs: 180,
            cache_capacity: 10_000_000,
            log_level: "info".to_owned(),
        }
    }
}

impl ServeConfig {
    /// Load configuration from environment variables.
    ///
    /// `ACCESS_KEY`/`SECRET_KEY` fall back to the conventional
    /// `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` names, so a process
    /// configured for the AWS CLI works unchanged.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("ACCESS_KEY").or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
        {
            config.access_key = v;
        }
        if let Ok(v) =
            std::env::var("SECRET_KEY").or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
        {
            config.secret_key = v;
        }
        if let Ok(v) = std::env::var("REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("BUCKET") {
            config.bucket = v;
        }
        if let Ok(v) = std::env::var("ROOT_PREFIX") {
            config.root_prefix = normalize_prefix(&v);
        }
        if let Ok(v) = std::env::var("LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("CACHE_ENABLED") {
            config.cache_enabled = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("CACHE_TTL_SECS") {
            if let Ok(secs) = v.parse() {
                config.cache_ttl_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("CACHE_CAPACITY") {
            if let Ok(bytes) = v.parse() {
                config.cache_capacity = bytes;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Strip leading/trailing separators from a configured root prefix so key
/// joins stay single-separator.
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_owned()
}
