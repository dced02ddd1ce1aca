//! The object-store boundary and the in-memory backend.
//!
//! The core depends on exactly two store operations: a metadata probe and a
//! forward-only byte stream opened at an offset. Everything else an object
//! store can do (listing, authentication, region discovery) is out of scope
//! here and lives with the concrete client.
//!
//! [`MemoryStore`] is the in-process backend used by unit and integration
//! tests. It mirrors the semantics the production client must provide,
//! including the not-found vs. transport error distinction, and can be
//! poisoned per key to simulate transport failures mid-chain.

use std::io::Cursor;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tokio::io::AsyncRead;
use tracing::trace;

use crate::error::StoreError;

/// Metadata snapshot for a stored object, as reported by a probe.
#[derive(Debug, Clone, Copy)]
pub struct ObjectMeta {
    /// Object size in bytes at probe time.
    pub size: u64,
    /// Last modification time at probe time.
    pub mod_time: DateTime<Utc>,
}

/// A forward-only byte stream over an object's content.
///
/// Seeking is not part of this type's contract; random access is achieved by
/// discarding a reader and opening a new one at a different offset.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Read-only access to a remote object store.
///
/// Implementations must be safe for concurrent use by many simultaneous
/// requests; the core never serializes access on their behalf.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Metadata-only existence and size check, distinct from opening a
    /// content stream.
    async fn probe(&self, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Open a byte stream over the object's content starting at `start`.
    ///
    /// The returned reader is forward-only and owns whatever network
    /// resources back it; dropping it releases them.
    async fn open_stream(&self, key: &str, start: u64) -> Result<ObjectReader, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Object data plus the metadata a probe reports for it.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    mod_time: DateTime<Utc>,
}

/// In-memory [`ObjectStore`] backend.
///
/// Thread-safe via [`DashMap`]. Used as the test fixture throughout the
/// workspace; keys registered with [`MemoryStore::poison`] fail with
/// [`StoreError::Transport`] instead of resolving, which lets tests drive
/// the chain-advancement paths.
///
/// # Examples
///
/// ```
/// use bucketserve_core::store::{MemoryStore, ObjectStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.insert("index.html", "<html></html>");
///
/// let meta = store.probe("index.html").await.unwrap();
/// assert_eq!(meta.size, 13);
/// # });
/// ```
pub struct MemoryStore {
    objects: DashMap<String, StoredObject>,
    poisoned: DashSet<String>,
    probes: DashMap<String, usize>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("objects_count", &self.objects.len())
            .field("poisoned_count", &self.poisoned.len())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            poisoned: DashSet::new(),
            probes: DashMap::new(),
        }
    }

    /// Insert an object with the current time as its modification time.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.insert_at(key, data, Utc::now());
    }

    /// Insert an object with an explicit modification time.
    pub fn insert_at(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        mod_time: DateTime<Utc>,
    ) {
        let key = key.into();
        trace!(key, "inserting object into memory store");
        self.objects.insert(
            key,
            StoredObject {
                data: data.into(),
                mod_time,
            },
        );
    }

    /// Remove an object. A no-op if the key is absent.
    pub fn remove(&self, key: &str) {
        self.objects.remove(key);
    }

    /// Mark a key so that probing or streaming it fails with a transport
    /// error, regardless of whether data exists for it.
    pub fn poison(&self, key: impl Into<String>) {
        self.poisoned.insert(key.into());
    }

    /// How many times `key` has been probed. Lets tests assert the chain's
    /// short-circuit and no-probe properties.
    #[must_use]
    pub fn probe_count(&self, key: &str) -> usize {
        self.probes.get(key).map_or(0, |count| *count)
    }

    /// Total probes across all keys.
    #[must_use]
    pub fn total_probe_count(&self) -> usize {
        self.probes.iter().map(|entry| *entry.value()).sum()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn check_poisoned(&self, key: &str) -> Result<(), StoreError> {
        if self.poisoned.contains(key) {
            return Err(StoreError::transport(format!(
                "simulated transport failure for {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn probe(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        *self.probes.entry(key.to_owned()).or_insert(0) += 1;
        self.check_poisoned(key)?;
        let entry = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        Ok(ObjectMeta {
            size: entry.data.len() as u64,
            mod_time: entry.mod_time,
        })
    }

    async fn open_stream(&self, key: &str, start: u64) -> Result<ObjectReader, StoreError> {
        self.check_poisoned(key)?;
        let entry = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        let len = entry.data.len() as u64;
        if start > len {
            return Err(StoreError::transport(format!(
                "stream start {start} beyond object size {len} for {key}"
            )));
        }
        let tail = entry.data.slice(usize::try_from(start).unwrap_or(usize::MAX)..);
        Ok(Box::pin(Cursor::new(tail)))
    }
}
