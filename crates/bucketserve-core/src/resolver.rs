//! Request path resolution: mapping an HTTP path to a fallback chain of
//! candidate object keys.
//!
//! Resolution is a pure function of the configured root prefix and the
//! request path; it performs no I/O and has no side effects. A path that
//! addresses a directory (trailing separator) never produces candidate keys
//! at all; it is answered by the synthetic directory variant of the virtual
//! file instead.
//!
//! For file paths the chain is fixed at three entries, in strict precedence
//! order:
//!
//! 1. the exact key under the root prefix,
//! 2. the `index.html` key under the path, to tolerate directory-style links
//!    written without a trailing separator,
//! 3. the bucket-wide `404.html` fallback page under the root prefix.

/// The directory index file name tried as the second candidate.
pub const INDEX_FILE: &str = "index.html";

/// The custom not-found page tried as the final candidate.
pub const NOT_FOUND_FILE: &str = "404.html";

/// Number of candidates in every chain produced for a file path.
pub const CHAIN_LEN: usize = 3;

/// Which role a candidate key plays in the fallback chain.
///
/// The kind travels with the winning candidate so downstream layers can
/// distinguish an exact hit from fallback content: the not-found page is
/// served with a not-found status even though it has a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// The request path mapped directly onto this key.
    Exact,
    /// The `index.html` fallback under the request path.
    DirectoryIndex,
    /// The bucket-wide custom not-found page.
    NotFoundPage,
}

/// A single candidate object key with its role in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The object key to probe.
    pub key: String,
    /// The role this candidate plays.
    pub kind: CandidateKind,
}

/// The ordered fallback chain for one request. Order encodes precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateChain {
    candidates: [Candidate; CHAIN_LEN],
}

impl CandidateChain {
    /// Iterate candidates in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// The candidate at `index`, if within the chain.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Number of candidates. Always [`CHAIN_LEN`].
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

impl IntoIterator for CandidateChain {
    type Item = Candidate;
    type IntoIter = std::array::IntoIter<Candidate, CHAIN_LEN>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

/// The outcome of path resolution: either a directory signal or a chain of
/// candidate keys to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path addressed a directory (trailing separator). `prefix` is the
    /// normalized path with the separator stripped; no keys are probed.
    Directory {
        /// Normalized directory path, no leading or trailing separator.
        prefix: String,
    },
    /// The path addressed a file; probe these candidates in order.
    Chain(CandidateChain),
}

/// Normalize a slash-separated request path into its canonical form.
///
/// Empty segments, `.` segments, and duplicate separators collapse; `..`
/// pops the previous segment and can never climb above the root. The result
/// carries no leading or trailing separator.
///
/// # Examples
///
/// ```
/// use bucketserve_core::resolver::normalize_request_path;
///
/// assert_eq!(normalize_request_path("/a//b/./c"), "a/b/c");
/// assert_eq!(normalize_request_path("/../../etc/passwd"), "etc/passwd");
/// assert_eq!(normalize_request_path("/"), "");
/// ```
#[must_use]
pub fn normalize_request_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Join a relative path under the root prefix. An empty root is the
/// identity join.
fn join_key(root_prefix: &str, rel: &str) -> String {
    match (root_prefix.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_owned(),
        (false, true) => root_prefix.to_owned(),
        (false, false) => format!("{root_prefix}/{rel}"),
    }
}

/// Map a request path to its [`Resolution`] under `root_prefix`.
///
/// A trailing separator marks a directory request and short-circuits to
/// [`Resolution::Directory`] without deriving any keys. Everything else
/// produces the fixed three-candidate chain.
///
/// # Examples
///
/// ```
/// use bucketserve_core::resolver::{CandidateKind, Resolution, resolve};
///
/// let Resolution::Chain(chain) = resolve("site", "/docs/guide") else {
///     panic!("expected a chain");
/// };
/// let keys: Vec<&str> = chain.iter().map(|c| c.key.as_str()).collect();
/// assert_eq!(keys, ["site/docs/guide", "site/docs/guide/index.html", "site/404.html"]);
///
/// assert_eq!(
///     resolve("site", "/docs/"),
///     Resolution::Directory { prefix: "docs".to_owned() },
/// );
/// ```
#[must_use]
pub fn resolve(root_prefix: &str, request_path: &str) -> Resolution {
    let normalized = normalize_request_path(request_path);

    if request_path.ends_with('/') {
        return Resolution::Directory { prefix: normalized };
    }

    let exact = join_key(root_prefix, &normalized);
    let index = if normalized.is_empty() {
        join_key(root_prefix, INDEX_FILE)
    } else {
        format!("{exact}/{INDEX_FILE}")
    };
    let not_found = join_key(root_prefix, NOT_FOUND_FILE);

    Resolution::Chain(CandidateChain {
        candidates: [
            Candidate {
                key: exact,
                kind: CandidateKind::Exact,
            },
            Candidate {
                key: index,
                kind: CandidateKind::DirectoryIndex,
            },
            Candidate {
                key: not_found,
                kind: CandidateKind::NotFoundPage,
            },
        ],
    })
}
