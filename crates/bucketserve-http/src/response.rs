//! Response construction: status mapping, common headers, error pages, and
//! directory listings.

use bucketserve_core::error::ServeError;
use bucketserve_core::vfs::DirEntry;
use http::StatusCode;
use tracing::debug;

use crate::body::FileBody;

/// Server name reported in the `Server` header.
pub const SERVER_NAME: &str = "BucketServe";

/// Build a plain-text response with the given status.
fn text_response(status: StatusCode, message: &str) -> http::Response<FileBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(FileBody::from_string(format!("{message}\n")))
        .expect("static response should be valid")
}

/// Map a request-scoped error to its HTTP response.
///
/// Chain exhaustion is an ordinary not-found; a transport failure on the
/// final candidate means the store could not be consulted, which is a bad
/// gateway from the client's point of view. Everything else is a server
/// fault.
#[must_use]
pub fn error_to_response(err: &ServeError, request_id: &str) -> http::Response<FileBody> {
    debug!(error = %err, request_id, "mapping error to response");
    match err {
        ServeError::ExhaustedChain { .. } => {
            text_response(StatusCode::NOT_FOUND, "404 page not found")
        }
        ServeError::Store { .. } | ServeError::Stream { .. } => {
            text_response(StatusCode::BAD_GATEWAY, "502 bad gateway")
        }
        ServeError::OutOfRange { .. } => text_response(
            StatusCode::RANGE_NOT_SATISFIABLE,
            "416 requested range not satisfiable",
        ),
        ServeError::NotADirectory | ServeError::InvalidState | ServeError::Internal(_) => {
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error")
        }
    }
}

/// Build a 304 Not Modified response.
#[must_use]
pub fn not_modified_response() -> http::Response<FileBody> {
    http::Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .body(FileBody::empty())
        .expect("static response should be valid")
}

/// Build a 405 response advertising the supported methods.
#[must_use]
pub fn method_not_allowed_response() -> http::Response<FileBody> {
    http::Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(http::header::ALLOW, "GET, HEAD")
        .body(FileBody::empty())
        .expect("static response should be valid")
}

/// Build a 416 response carrying the total size per RFC 9110.
#[must_use]
pub fn unsatisfiable_range_response(size: u64) -> http::Response<FileBody> {
    http::Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(http::header::CONTENT_RANGE, format!("bytes */{size}"))
        .body(FileBody::empty())
        .expect("static response should be valid")
}

/// Render a minimal HTML directory listing.
///
/// The store is never enumerated, so the listing is usually empty; the page
/// exists so a separator-terminated request without an index file still
/// gets a well-formed answer.
#[must_use]
pub fn directory_listing_response(prefix: &str, entries: &[DirEntry]) -> http::Response<FileBody> {
    let title = if prefix.is_empty() {
        "/".to_owned()
    } else {
        format!("/{prefix}/")
    };

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head><title>Index of ");
    page.push_str(&title);
    page.push_str("</title></head>\n<body>\n<h1>Index of ");
    page.push_str(&title);
    page.push_str("</h1>\n<ul>\n");
    for entry in entries {
        let suffix = if entry.info.is_directory { "/" } else { "" };
        page.push_str(&format!(
            "<li><a href=\"{name}{suffix}\">{name}{suffix}</a></li>\n",
            name = entry.name
        ));
    }
    page.push_str("</ul>\n</body>\n</html>\n");

    http::Response::builder()
        .status(StatusCode::OK)
        .header(
            http::header::CONTENT_TYPE,
            mime::TEXT_HTML_UTF_8.as_ref(),
        )
        .body(FileBody::from_string(page))
        .expect("static response should be valid")
}

/// Add common response headers to every response.
#[must_use]
pub fn add_common_headers(
    mut response: http::Response<FileBody>,
    request_id: &str,
) -> http::Response<FileBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static(SERVER_NAME),
    );

    response
}
