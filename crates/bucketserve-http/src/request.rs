//! Request-side parsing helpers: path decoding, range evaluation,
//! conditional headers, and content-type guessing.

use chrono::{DateTime, Utc};
use mime::Mime;
use percent_encoding::percent_decode_str;

/// Percent-decode a request path. Invalid sequences decode lossily rather
/// than failing the request.
#[must_use]
pub fn decode_request_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Range requests
// ---------------------------------------------------------------------------

/// The handler-relevant outcome of evaluating a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable range: header absent, malformed, a non-bytes unit, or a
    /// multi-range request. Serve the full content with 200.
    Full,
    /// A single satisfiable range, inclusive on both ends.
    Partial(u64, u64),
    /// Syntactically valid but unsatisfiable; respond 416.
    Unsatisfiable,
}

/// Evaluate a `Range` header against the snapshotted content length.
///
/// Single-range `bytes=` forms only; the end offset is clamped to
/// `content_length - 1`. Malformed headers are ignored per RFC 9110 (the
/// full representation is served), while well-formed ranges that select no
/// bytes are unsatisfiable. Multi-range requests are treated as no range.
///
/// # Examples
///
/// ```
/// use bucketserve_http::request::{RangeOutcome, evaluate_range};
///
/// assert_eq!(evaluate_range(Some("bytes=0-499"), 1000), RangeOutcome::Partial(0, 499));
/// assert_eq!(evaluate_range(Some("bytes=500-"), 1000), RangeOutcome::Partial(500, 999));
/// assert_eq!(evaluate_range(Some("bytes=-200"), 1000), RangeOutcome::Partial(800, 999));
/// assert_eq!(evaluate_range(Some("bytes=2000-"), 1000), RangeOutcome::Unsatisfiable);
/// assert_eq!(evaluate_range(None, 1000), RangeOutcome::Full);
/// ```
#[must_use]
pub fn evaluate_range(header: Option<&str>, content_length: u64) -> RangeOutcome {
    let Some(header) = header else {
        return RangeOutcome::Full;
    };
    let Some(range) = header.strip_prefix("bytes=") else {
        return RangeOutcome::Full;
    };
    if range.contains(',') {
        // Multipart ranges are not produced here; serve the full body.
        return RangeOutcome::Full;
    }

    if content_length == 0 {
        return RangeOutcome::Unsatisfiable;
    }

    if let Some(suffix) = range.strip_prefix('-') {
        // bytes=-N  (last N bytes)
        let Ok(n) = suffix.parse::<u64>() else {
            return RangeOutcome::Full;
        };
        if n == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        let start = content_length.saturating_sub(n);
        RangeOutcome::Partial(start, content_length - 1)
    } else if let Some(prefix) = range.strip_suffix('-') {
        // bytes=N-  (from N to end)
        let Ok(start) = prefix.parse::<u64>() else {
            return RangeOutcome::Full;
        };
        if start >= content_length {
            return RangeOutcome::Unsatisfiable;
        }
        RangeOutcome::Partial(start, content_length - 1)
    } else {
        // bytes=N-M
        let Some((first, second)) = range.split_once('-') else {
            return RangeOutcome::Full;
        };
        let (Ok(start), Ok(end)) = (first.parse::<u64>(), second.parse::<u64>()) else {
            return RangeOutcome::Full;
        };
        if start > end {
            return RangeOutcome::Full;
        }
        if start >= content_length {
            return RangeOutcome::Unsatisfiable;
        }
        RangeOutcome::Partial(start, end.min(content_length - 1))
    }
}

// ---------------------------------------------------------------------------
// Conditional requests
// ---------------------------------------------------------------------------

/// Format a timestamp as an HTTP-date (IMF-fixdate).
#[must_use]
pub fn format_http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP-date header value. Returns `None` for anything
/// unparseable; callers must then ignore the condition.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Whether an `If-Modified-Since` condition holds, i.e. the resource has
/// not changed since the given date. HTTP-dates carry second granularity,
/// so the comparison truncates sub-second precision.
#[must_use]
pub fn not_modified_since(if_modified_since: Option<&str>, mod_time: DateTime<Utc>) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    mod_time.timestamp() <= since.timestamp()
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

/// Guess a content type from the object key's extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
#[must_use]
pub fn content_type_for_key(key: &str) -> Mime {
    let ext = key
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => mime::TEXT_HTML_UTF_8,
        "css" => mime::TEXT_CSS,
        "js" | "mjs" => mime::TEXT_JAVASCRIPT,
        "json" => mime::APPLICATION_JSON,
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "xml" => mime::TEXT_XML,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "svg" => mime::IMAGE_SVG,
        "pdf" => mime::APPLICATION_PDF,
        "ico" => parse_or_octet("image/x-icon"),
        "webp" => parse_or_octet("image/webp"),
        "wasm" => parse_or_octet("application/wasm"),
        "woff" => parse_or_octet("font/woff"),
        "woff2" => parse_or_octet("font/woff2"),
        "mp4" => parse_or_octet("video/mp4"),
        "webm" => parse_or_octet("video/webm"),
        "mp3" => parse_or_octet("audio/mpeg"),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Parse a literal media type, falling back to `application/octet-stream`.
fn parse_or_octet(value: &str) -> Mime {
    value.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
