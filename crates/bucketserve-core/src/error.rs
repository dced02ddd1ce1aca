//! Error types for the BucketServe core.
//!
//! Two layers of errors exist. [`StoreError`] is what the object-store
//! boundary produces: it only distinguishes "the key does not exist" from
//! "the transport failed", because that distinction is what drives fallback
//! chain advancement. [`ServeError`] is the request-scoped taxonomy the rest
//! of the core works with; resolution-time store failures are folded into it
//! once the chain has no more candidates to try.

/// Error produced by an [`ObjectStore`](crate::store::ObjectStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested key does not exist in the store.
    #[error("the specified key does not exist: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// Any store failure other than a missing key: network errors,
    /// permission denials, malformed responses.
    #[error("object store transport failure: {message}")]
    Transport {
        /// Human-readable description of the underlying failure.
        message: String,
    },
}

impl StoreError {
    /// Build a [`StoreError::NotFound`] for `key`.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Build a [`StoreError::Transport`] from anything displayable.
    #[must_use]
    pub fn transport(message: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: message.to_string(),
        }
    }

    /// Whether this error means the key is absent (recoverable by chain
    /// advancement) rather than the store being unreachable.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Request-scoped error type for resolution and virtual file operations.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    // -----------------------------------------------------------------------
    // Resolution errors
    // -----------------------------------------------------------------------
    /// Every candidate in the fallback chain failed to resolve.
    #[error("no candidate key resolved for request path: {path}")]
    ExhaustedChain {
        /// The normalized request path whose chain was exhausted.
        path: String,
    },

    /// The final candidate of the chain failed with a transport error, so
    /// the request cannot be answered with a not-found response in good
    /// conscience.
    #[error("object store error while resolving {key}: {source}")]
    Store {
        /// The candidate key whose probe failed.
        key: String,
        /// The underlying store failure.
        source: StoreError,
    },

    // -----------------------------------------------------------------------
    // Virtual file errors
    // -----------------------------------------------------------------------
    /// The backing stream broke during an in-progress read.
    #[error("stream failure while reading {key}: {message}")]
    Stream {
        /// The object key being streamed.
        key: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// A seek target lies outside the snapshotted object size.
    #[error("seek offset {offset} out of range for object of {size} bytes")]
    OutOfRange {
        /// The requested absolute offset (may be negative for relative
        /// seeks that underflow).
        offset: i64,
        /// The snapshotted object size.
        size: u64,
    },

    /// A directory-only operation was invoked on an object-backed file.
    #[error("not a directory")]
    NotADirectory,

    /// An operation was invoked on a virtual file that is already closed.
    /// This is a programming-contract violation in the caller.
    #[error("operation on closed virtual file")]
    InvalidState,

    // -----------------------------------------------------------------------
    // Internal / catch-all
    // -----------------------------------------------------------------------
    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServeError {
    /// Build a [`ServeError::Stream`] for `key` from anything displayable.
    #[must_use]
    pub fn stream(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Stream {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience result type for core operations.
pub type ServeResult<T> = Result<T, ServeError>;
