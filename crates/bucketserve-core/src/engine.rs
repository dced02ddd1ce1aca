//! The resolution engine: walking a candidate chain against the object
//! store and producing the virtual file that answers a request.
//!
//! Candidates are probed strictly in chain order; precedence is policy,
//! not a race, so the engine never probes in parallel. A missing key simply
//! advances the chain. Transport failures also advance the chain (a later
//! candidate, notably the custom not-found page, must still get its
//! chance), but are logged; if the *final* candidate fails on transport
//! there is nothing left to fall back to and the failure surfaces to the
//! caller as a store error rather than a not-found.
//!
//! Probing before streaming matters: a stream handle can sometimes be
//! obtained for a key whose metadata lookup fails, and committing to such a
//! stream would hand the caller a broken body. The explicit probe is also
//! what takes the size/mod-time snapshot the virtual file serves from.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{ServeError, ServeResult, StoreError};
use crate::resolver::{self, CandidateKind, Resolution};
use crate::store::{ObjectMeta, ObjectStore};
use crate::vfs::VirtualFile;

/// A successfully resolved object: the winning candidate key, its role in
/// the chain, and the metadata snapshot taken by the probe.
#[derive(Debug, Clone)]
pub struct FoundObject {
    /// The object key that answered the request.
    pub key: String,
    /// Which chain candidate won.
    pub kind: CandidateKind,
    /// Size and mod-time snapshot from the probe.
    pub meta: ObjectMeta,
}

/// The outcome of resolving one request path.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A concrete object answers the request.
    Object(FoundObject),
    /// The request addressed a directory; no keys were probed.
    Directory {
        /// Normalized directory prefix, no trailing separator.
        prefix: String,
    },
}

/// Walks fallback chains against an [`ObjectStore`].
///
/// The engine is constructed once at startup from immutable configuration
/// and shared across requests; it holds no per-request state.
pub struct ResolutionEngine {
    store: Arc<dyn ObjectStore>,
    root_prefix: String,
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("root_prefix", &self.root_prefix)
            .finish()
    }
}

impl ResolutionEngine {
    /// Create an engine serving keys under `root_prefix` from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, root_prefix: impl Into<String>) -> Self {
        Self {
            store,
            root_prefix: root_prefix.into(),
        }
    }

    /// The configured root prefix.
    #[must_use]
    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Resolve a request path to the first candidate the store can answer.
    ///
    /// # Errors
    ///
    /// [`ServeError::ExhaustedChain`] when every candidate is absent;
    /// [`ServeError::Store`] when the final candidate failed on transport.
    pub async fn resolve(&self, request_path: &str) -> ServeResult<Resolved> {
        match resolver::resolve(&self.root_prefix, request_path) {
            Resolution::Directory { prefix } => {
                trace!(request_path, prefix, "directory request, skipping probes");
                Ok(Resolved::Directory { prefix })
            }
            Resolution::Chain(chain) => {
                let mut last_error: Option<(String, StoreError)> = None;

                for candidate in chain {
                    match self.store.probe(&candidate.key).await {
                        Ok(meta) => {
                            debug!(
                                request_path,
                                key = %candidate.key,
                                kind = ?candidate.kind,
                                size = meta.size,
                                "resolved candidate"
                            );
                            return Ok(Resolved::Object(FoundObject {
                                key: candidate.key,
                                kind: candidate.kind,
                                meta,
                            }));
                        }
                        Err(err) if err.is_not_found() => {
                            trace!(key = %candidate.key, "candidate absent, advancing chain");
                            last_error = None;
                        }
                        Err(err) => {
                            warn!(
                                key = %candidate.key,
                                error = %err,
                                "candidate probe failed, advancing chain"
                            );
                            last_error = Some((candidate.key, err));
                        }
                    }
                }

                // The chain is exhausted. If the last candidate died on
                // transport rather than being absent, there is no honest
                // not-found answer to give.
                match last_error {
                    Some((key, source)) => Err(ServeError::Store { key, source }),
                    None => Err(ServeError::ExhaustedChain {
                        path: resolver::normalize_request_path(request_path),
                    }),
                }
            }
        }
    }

    /// Resolve a request path and wrap the outcome in a [`VirtualFile`].
    ///
    /// # Errors
    ///
    /// Same as [`ResolutionEngine::resolve`].
    pub async fn open(&self, request_path: &str) -> ServeResult<VirtualFile> {
        match self.resolve(request_path).await? {
            Resolved::Object(found) => Ok(VirtualFile::object(
                Arc::clone(&self.store),
                found.key,
                found.kind,
                found.meta,
            )),
            Resolved::Directory { prefix } => Ok(VirtualFile::directory(prefix)),
        }
    }
}
