//! The virtual file: a seekable, statable view over a resolved remote
//! object or a synthetic directory.
//!
//! The underlying store only hands out forward-only streams, so random
//! access is simulated: a seek that moves the cursor discards the current
//! stream, and the next read opens a fresh ranged stream at the new offset.
//! Callers never observe the reopen; they see ordinary read/seek
//! semantics.
//!
//! Metadata is a snapshot taken at resolution time. Concurrent writers may
//! mutate or delete the backing object afterwards; readers either observe
//! the snapshot or hit a stream error on their next read. The reported size
//! never changes after construction.
//!
//! Lifecycle: `Open -> {Reading <-> Seeking} -> Closed`. Close is
//! idempotent and terminal: any operation on a closed handle fails with
//! [`ServeError::InvalidState`]. Dropping the file releases the stream as
//! well, so a forgotten close cannot leak a connection.

use std::io::SeekFrom;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::AsyncReadExt;
use tracing::trace;

use crate::error::{ServeError, ServeResult};
use crate::resolver::CandidateKind;
use crate::store::{ObjectMeta, ObjectReader, ObjectStore};

/// Stat result for a virtual file.
#[derive(Debug, Clone, Copy)]
pub struct FileInfo {
    /// Size in bytes. Zero for directories.
    pub size: u64,
    /// Last modification time; synthetic for directories.
    pub mod_time: DateTime<Utc>,
    /// Whether this is the directory variant.
    pub is_directory: bool,
}

/// A single entry in a directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name relative to the directory.
    pub name: String,
    /// Entry metadata.
    pub info: FileInfo,
}

/// A virtual file: either a view over one resolved object, or a synthetic
/// directory marker. Never both.
#[derive(Debug)]
pub enum VirtualFile {
    /// Object-backed variant streaming content from the store.
    Object(ObjectFile),
    /// Synthetic directory variant; carries no remote object.
    Directory(DirectoryMarker),
}

impl VirtualFile {
    /// Wrap a resolved object into a readable, seekable file.
    #[must_use]
    pub fn object(
        store: Arc<dyn ObjectStore>,
        key: impl Into<String>,
        kind: CandidateKind,
        meta: ObjectMeta,
    ) -> Self {
        Self::Object(ObjectFile {
            store,
            key: key.into(),
            kind,
            meta,
            pos: 0,
            reader: None,
            closed: false,
        })
    }

    /// Create the synthetic directory variant for a normalized prefix.
    #[must_use]
    pub fn directory(prefix: impl Into<String>) -> Self {
        Self::Directory(DirectoryMarker {
            prefix: prefix.into(),
            mod_time: Utc::now(),
            closed: false,
        })
    }

    /// The backing object key, if this is the object variant.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Object(f) => Some(&f.key),
            Self::Directory(_) => None,
        }
    }

    /// Which fallback-chain candidate produced this file, if any.
    #[must_use]
    pub fn resolution_kind(&self) -> Option<CandidateKind> {
        match self {
            Self::Object(f) => Some(f.kind),
            Self::Directory(_) => None,
        }
    }

    /// Read up to `buf.len()` bytes from the current cursor, advancing it.
    ///
    /// Returns `Ok(0)` at end of file. The directory variant has no content
    /// and always reports end of file.
    ///
    /// # Errors
    ///
    /// [`ServeError::Stream`] if the backing transport breaks mid-read or
    /// ends before the snapshotted size; [`ServeError::InvalidState`] after
    /// close.
    pub async fn read(&mut self, buf: &mut [u8]) -> ServeResult<usize> {
        match self {
            Self::Object(f) => f.read(buf).await,
            Self::Directory(d) => {
                d.ensure_open()?;
                Ok(0)
            }
        }
    }

    /// Reposition the cursor. Returns the new absolute offset.
    ///
    /// On the object variant a cursor move discards the current stream; the
    /// next read transparently reopens a ranged stream at the new offset. A
    /// seek alone performs no I/O and delivers no bytes.
    ///
    /// # Errors
    ///
    /// [`ServeError::OutOfRange`] if the target is negative or beyond the
    /// snapshotted size; [`ServeError::InvalidState`] after close.
    pub fn seek(&mut self, pos: SeekFrom) -> ServeResult<u64> {
        match self {
            Self::Object(f) => f.seek(pos),
            Self::Directory(d) => {
                d.ensure_open()?;
                Ok(0)
            }
        }
    }

    /// Return the metadata snapshot taken at resolution time. Never
    /// re-queries the store.
    ///
    /// # Errors
    ///
    /// [`ServeError::InvalidState`] after close.
    pub fn stat(&self) -> ServeResult<FileInfo> {
        match self {
            Self::Object(f) => {
                f.ensure_open()?;
                Ok(FileInfo {
                    size: f.meta.size,
                    mod_time: f.meta.mod_time,
                    is_directory: false,
                })
            }
            Self::Directory(d) => {
                d.ensure_open()?;
                Ok(FileInfo {
                    size: 0,
                    mod_time: d.mod_time,
                    is_directory: true,
                })
            }
        }
    }

    /// List the directory's children.
    ///
    /// The store is accessed read-only and bucket listing is not part of
    /// this design, so the directory variant yields the policy-defined
    /// empty listing; content discovery happens through direct path
    /// requests.
    ///
    /// # Errors
    ///
    /// [`ServeError::NotADirectory`] on the object variant;
    /// [`ServeError::InvalidState`] after close.
    pub fn read_dir(&self) -> ServeResult<Vec<DirEntry>> {
        match self {
            Self::Object(f) => {
                f.ensure_open()?;
                Err(ServeError::NotADirectory)
            }
            Self::Directory(d) => {
                d.ensure_open()?;
                Ok(Vec::new())
            }
        }
    }

    /// Release the underlying stream. Idempotent; closing twice is a no-op.
    pub fn close(&mut self) {
        match self {
            Self::Object(f) => {
                if !f.closed {
                    trace!(key = %f.key, "closing virtual file");
                }
                f.reader = None;
                f.closed = true;
            }
            Self::Directory(d) => {
                d.closed = true;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectFile
// ---------------------------------------------------------------------------

/// The object-backed variant of [`VirtualFile`].
pub struct ObjectFile {
    store: Arc<dyn ObjectStore>,
    key: String,
    kind: CandidateKind,
    meta: ObjectMeta,
    pos: u64,
    reader: Option<ObjectReader>,
    closed: bool,
}

impl std::fmt::Debug for ObjectFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFile")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("size", &self.meta.size)
            .field("pos", &self.pos)
            .field("stream_open", &self.reader.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl ObjectFile {
    fn ensure_open(&self) -> ServeResult<()> {
        if self.closed {
            return Err(ServeError::InvalidState);
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> ServeResult<usize> {
        self.ensure_open()?;

        let remaining = self.meta.size.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        if self.reader.is_none() {
            let reader = self
                .store
                .open_stream(&self.key, self.pos)
                .await
                .map_err(|e| ServeError::stream(self.key.as_str(), e))?;
            self.reader = Some(reader);
        }

        // Reads never cross the snapshotted size, even if the backing
        // object grew after resolution.
        let want = usize::try_from(remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let Some(reader) = self.reader.as_mut() else {
            return Err(ServeError::stream(self.key.as_str(), "stream unavailable"));
        };
        let n = reader
            .read(&mut buf[..want])
            .await
            .map_err(|e| ServeError::stream(self.key.as_str(), e))?;

        if n == 0 {
            // The stream ended before the snapshot said it should: the
            // object shrank or the transport cut the body short.
            return Err(ServeError::stream(
                self.key.as_str(),
                format!("unexpected end of stream at offset {}", self.pos),
            ));
        }

        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> ServeResult<u64> {
        self.ensure_open()?;

        let size = i128::from(self.meta.size);
        let target: i128 = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => size + i128::from(delta),
        };

        if target < 0 || target > size {
            return Err(ServeError::OutOfRange {
                offset: i64::try_from(target).unwrap_or(i64::MAX),
                size: self.meta.size,
            });
        }

        let target = target as u64;
        if target != self.pos {
            // The transport is forward-only: moving the cursor invalidates
            // the current stream and the next read reopens at the target.
            self.reader = None;
            self.pos = target;
        }
        Ok(self.pos)
    }
}

// ---------------------------------------------------------------------------
// DirectoryMarker
// ---------------------------------------------------------------------------

/// The synthetic directory variant of [`VirtualFile`].
#[derive(Debug)]
pub struct DirectoryMarker {
    prefix: String,
    mod_time: DateTime<Utc>,
    closed: bool,
}

impl DirectoryMarker {
    /// The normalized directory prefix this marker represents.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn ensure_open(&self) -> ServeResult<()> {
        if self.closed {
            return Err(ServeError::InvalidState);
        }
        Ok(())
    }
}
