//! Core path resolution and virtual file machinery for BucketServe.
//!
//! BucketServe exposes a remote object-storage bucket as a browsable tree of
//! HTTP resources. This crate is the part with the ideas in it:
//!
//! - **Resolver** ([`resolver`]): a pure function mapping a request path to
//!   its ordered fallback chain of candidate object keys (exact key,
//!   `index.html` fallback, bucket-wide `404.html`), or to a directory
//!   signal for paths ending in a separator.
//!
//! - **Engine** ([`engine`]): walks the chain against the store, strictly in
//!   order, swallowing missing keys and logging transport failures, and
//!   snapshots the winner's metadata.
//!
//! - **Virtual file** ([`vfs`]): adapts the winning object's forward-only
//!   network stream into a seekable, statable file handle; seeks reopen a
//!   ranged stream behind the scenes. A synthetic directory variant covers
//!   separator-terminated requests.
//!
//! - **Store boundary** ([`store`]): the two-operation trait (`probe`,
//!   `open_stream`) concrete clients implement, plus the in-memory backend
//!   the test suites run against.
//!
//! Everything here is request-scoped or immutable after startup; the store
//! client is the only shared resource and brings its own concurrency
//! discipline.

pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod store;
pub mod vfs;

// Re-export key types for convenience.
pub use config::ServeConfig;
pub use engine::{FoundObject, Resolved, ResolutionEngine};
pub use error::{ServeError, ServeResult, StoreError};
pub use resolver::{Candidate, CandidateChain, CandidateKind, Resolution};
pub use store::{MemoryStore, ObjectMeta, ObjectReader, ObjectStore};
pub use vfs::{DirEntry, DirectoryMarker, FileInfo, ObjectFile, VirtualFile};
