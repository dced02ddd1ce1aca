//! HTTP layer for BucketServe: the file-serving hyper service, range and
//! conditional request handling, streaming bodies, and the response cache.
//!
//! - **Service** ([`service`]): the main [`FileService`](service::FileService)
//!   implementing hyper's `Service` trait. Resolves each request through the
//!   core engine and streams the winning object.
//!
//! - **Request helpers** ([`request`]): path decoding, `Range` evaluation,
//!   HTTP-date handling, content-type guessing.
//!
//! - **Responses** ([`response`]): status mapping for the core error
//!   taxonomy, common headers, directory listings.
//!
//! - **Body** ([`body`]): the [`FileBody`](body::FileBody) type supporting
//!   buffered, empty, and streaming modes.
//!
//! - **Cache** ([`cache`]): the optional LRU/TTL
//!   [`CachedFileService`](cache::CachedFileService) decorator with a
//!   manual-refresh query key.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> CachedFileService (optional: LRU/TTL replay, refresh key)
//!     -> FileService (hyper Service)
//!       -> method gate, path decoding
//!       -> ResolutionEngine (fallback chain -> VirtualFile)
//!       -> conditional / range handling (stat, seek)
//!       -> streaming body pump (read, close)
//!   <- HTTP Response
//! ```

pub mod body;
pub mod cache;
pub mod request;
pub mod response;
pub mod service;

// Re-export key types for convenience.
pub use body::FileBody;
pub use cache::{CacheConfig, CachedFileService, ResponseCache};
pub use request::RangeOutcome;
pub use service::FileService;
