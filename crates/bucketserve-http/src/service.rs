//! The file-serving hyper service.
//!
//! [`FileService`] drives the whole request lifecycle against the core's
//! capability surface: one `stat` up front, sequential reads, and an
//! occasional seek for range requests.
//!
//! 1. Method gate (`GET`/`HEAD` only)
//! 2. Path decoding and resolution via the engine
//! 3. Directory handling (index convention, then listing)
//! 4. Conditional handling (`If-Modified-Since`)
//! 5. Range evaluation and seek
//! 6. Body streaming through a bounded channel, with the virtual file
//!    closed on every exit path, including mid-stream failure and client
//!    abandonment
//!
//! Status mapping follows the chain's intent: content found through the
//! not-found fallback page is served with status 404, never 200, and range
//! or conditional semantics are not applied to it.

use std::convert::Infallible;
use std::future::Future;
use std::io::SeekFrom;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bucketserve_core::engine::ResolutionEngine;
use bucketserve_core::resolver::{CandidateKind, INDEX_FILE, normalize_request_path};
use bucketserve_core::vfs::{FileInfo, VirtualFile};

use crate::body::FileBody;
use crate::request::{
    RangeOutcome, content_type_for_key, decode_request_path, evaluate_range, format_http_date,
    not_modified_since,
};
use crate::response::{
    add_common_headers, directory_listing_response, error_to_response, method_not_allowed_response,
    not_modified_response, unsatisfiable_range_response,
};

/// Chunk size for streaming bodies.
const STREAM_CHUNK: usize = 64 * 1024;

/// The file-serving service. Cheap to clone; all state is shared.
#[derive(Debug, Clone)]
pub struct FileService {
    engine: Arc<ResolutionEngine>,
}

impl FileService {
    /// Create a service answering requests through `engine`.
    #[must_use]
    pub fn new(engine: Arc<ResolutionEngine>) -> Self {
        Self { engine }
    }
}

impl<B> hyper::service::Service<http::Request<B>> for FileService {
    type Response = http::Response<FileBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let engine = Arc::clone(&self.engine);
        // The request body is irrelevant for GET/HEAD serving; keep only
        // the parts so the spawned future stays `Send` regardless of B.
        let (parts, _body) = req.into_parts();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(&parts, &engine, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process one request through resolution and serving.
async fn process_request(
    parts: &http::request::Parts,
    engine: &ResolutionEngine,
    request_id: &str,
) -> http::Response<FileBody> {
    let method = &parts.method;
    let path = decode_request_path(parts.uri.path());
    debug!(%method, path, request_id, "processing request");

    let head_only = if *method == Method::HEAD {
        true
    } else if *method == Method::GET {
        false
    } else {
        return method_not_allowed_response();
    };

    let mut file = match engine.open(&path).await {
        Ok(file) => file,
        Err(err) => {
            info!(path, error = %err, request_id, "resolution failed");
            return error_to_response(&err, request_id);
        }
    };

    let info = match file.stat() {
        Ok(info) => info,
        Err(err) => {
            file.close();
            return error_to_response(&err, request_id);
        }
    };

    if info.is_directory {
        return serve_directory(parts, engine, file, &path, request_id, head_only).await;
    }
    serve_file(parts, file, info, request_id, head_only)
}

/// Serve a directory request: apply the index convention, fall back to a
/// listing when the index chain exhausts.
async fn serve_directory(
    parts: &http::request::Parts,
    engine: &ResolutionEngine,
    mut dir: VirtualFile,
    path: &str,
    request_id: &str,
    head_only: bool,
) -> http::Response<FileBody> {
    let index_path = format!("{path}{INDEX_FILE}");

    let response = match engine.open(&index_path).await {
        // The index path never ends in a separator, so a hit is always an
        // object-backed file.
        Ok(mut index) => match index.stat() {
            Ok(info) => serve_file(parts, index, info, request_id, head_only),
            Err(err) => {
                index.close();
                error_to_response(&err, request_id)
            }
        },
        Err(bucketserve_core::ServeError::ExhaustedChain { .. }) => match dir.read_dir() {
            Ok(entries) => {
                let prefix = normalize_request_path(path);
                directory_listing_response(&prefix, &entries)
            }
            Err(err) => error_to_response(&err, request_id),
        },
        Err(err) => {
            info!(path = index_path, error = %err, request_id, "index resolution failed");
            error_to_response(&err, request_id)
        }
    };

    dir.close();
    response
}

/// Serve an object-backed virtual file, honoring conditional and range
/// semantics for regular content.
fn serve_file(
    parts: &http::request::Parts,
    mut file: VirtualFile,
    info: FileInfo,
    request_id: &str,
    head_only: bool,
) -> http::Response<FileBody> {
    let kind = file
        .resolution_kind()
        .unwrap_or(CandidateKind::Exact);
    let is_fallback_page = kind == CandidateKind::NotFoundPage;

    // Conditional and range semantics apply to real content only; the
    // fallback page is an error body, not the requested representation.
    if !is_fallback_page {
        let if_modified_since = header_str(parts, http::header::IF_MODIFIED_SINCE);
        if not_modified_since(if_modified_since, info.mod_time) {
            file.close();
            return not_modified_response();
        }
    }

    let range = if is_fallback_page || head_only {
        RangeOutcome::Full
    } else {
        evaluate_range(header_str(parts, http::header::RANGE), info.size)
    };

    let status = if is_fallback_page {
        StatusCode::NOT_FOUND
    } else {
        match range {
            RangeOutcome::Partial(..) => StatusCode::PARTIAL_CONTENT,
            RangeOutcome::Full | RangeOutcome::Unsatisfiable => StatusCode::OK,
        }
    };

    let key = file.key().unwrap_or_default().to_owned();
    let mut builder = http::Response::builder()
        .status(status)
        .header(
            http::header::CONTENT_TYPE,
            content_type_for_key(&key).as_ref(),
        )
        .header(http::header::ACCEPT_RANGES, "bytes")
        .header(
            http::header::LAST_MODIFIED,
            format_http_date(info.mod_time),
        );

    let (offset, length) = match range {
        RangeOutcome::Full => (0, info.size),
        RangeOutcome::Partial(start, end) => {
            builder = builder.header(
                http::header::CONTENT_RANGE,
                format!("bytes {start}-{end}/{}", info.size),
            );
            (start, end - start + 1)
        }
        RangeOutcome::Unsatisfiable => {
            file.close();
            return unsatisfiable_range_response(info.size);
        }
    };
    builder = builder.header(http::header::CONTENT_LENGTH, length);

    if head_only || length == 0 {
        file.close();
        return builder
            .body(FileBody::empty())
            .expect("static response should be valid");
    }

    if offset > 0 {
        if let Err(err) = file.seek(SeekFrom::Start(offset)) {
            file.close();
            return error_to_response(&err, request_id);
        }
    }

    debug!(key, status = %status, offset, length, request_id, "streaming object");
    builder
        .body(stream_body(file, length))
        .expect("static response should be valid")
}

/// Spawn the pump task feeding a streaming body.
///
/// The file is closed on every exit: normal completion, stream failure, and
/// the send error that signals the client dropped the response.
fn stream_body(mut file: VirtualFile, length: u64) -> FileBody {
    let (tx, body) = FileBody::streaming();

    tokio::spawn(async move {
        let mut buf = vec![0_u8; STREAM_CHUNK];
        let mut remaining = length;

        while remaining > 0 {
            let want = buf
                .len()
                .min(usize::try_from(remaining).unwrap_or(usize::MAX));
            match file.read(&mut buf[..want]).await {
                Ok(0) => break,
                Ok(n) => {
                    remaining -= n as u64;
                    if tx
                        .send(Ok(Bytes::copy_from_slice(&buf[..n])))
                        .await
                        .is_err()
                    {
                        debug!("response body dropped, aborting stream");
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "stream failed mid-response");
                    let _ = tx.send(Err(std::io::Error::other(err))).await;
                    break;
                }
            }
        }

        file.close();
    });

    body
}

/// Fetch a header as a string slice, ignoring non-UTF-8 values.
fn header_str<'a>(parts: &'a http::request::Parts, name: http::header::HeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
