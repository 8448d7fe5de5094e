//! `GET /download` and the shared file response used by every file route.
//!
//! Supports the usual validators (`ETag`, `Last-Modified`), conditional
//! requests (`If-None-Match`, `If-Modified-Since`) and single byte ranges
//! (`Range`, `If-Range`).

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use httpdate::{fmt_http_date, parse_http_date};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{blocking, PathQuery};
use crate::http::response::{stream_body, ApiError};
use crate::http::server::AppState;
use crate::storage::{EntryMetadata, Vfs};

/// How the client should treat the body.
#[derive(Debug, Clone, Copy)]
pub enum Disposition<'a> {
    /// Render in place (the index page).
    Inline,
    /// Save under the given file name.
    Attachment(&'a str),
}

pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    blocking(move || {
        let fs = state.fs.as_ref();
        let target = state.root.safe_path(fs, &query.path)?;
        let name = file_name(&target);
        file_response(fs, &target, Disposition::Attachment(&name), &headers)
    })
    .await
}

/// Build a streamed response for the regular file at `path`.
///
/// Anything that is not a regular file answers 404.
pub fn file_response(
    fs: &dyn Vfs,
    path: &Path,
    disposition: Disposition<'_>,
    request: &HeaderMap,
) -> Result<Response, ApiError> {
    let meta = fs.metadata(path)?;
    if !meta.is_file() {
        return Err(ApiError::NotFound);
    }

    let validators = Validators::new(&meta);
    let mut builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, validators.etag.as_str());
    if let Some(last_modified) = &validators.last_modified {
        builder = builder.header(header::LAST_MODIFIED, last_modified.as_str());
    }

    if validators.not_modified(request) {
        return builder
            .status(StatusCode::NOT_MODIFIED)
            .body(Body::empty())
            .map_err(|e| ApiError::Internal(e.to_string()));
    }

    let range = if validators.if_range_matches(request) {
        parse_range(request.get(header::RANGE), meta.len)?
    } else {
        None
    };

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    builder = builder.header(header::CONTENT_TYPE, content_type.essence_str());
    if let Disposition::Attachment(name) = disposition {
        builder = builder.header(header::CONTENT_DISPOSITION, content_disposition(name));
    }

    let reader = fs.open(path)?;
    let response = match range {
        Some((start, end)) => {
            let length = end - start + 1;
            tracing::debug!(path = %path.display(), start, end, "serving byte range");
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, meta.len),
                )
                .header(header::CONTENT_LENGTH, length)
                .body(stream_body(reader, start, length, ()))
        }
        None => {
            tracing::debug!(path = %path.display(), size = meta.len, "serving file");
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, meta.len)
                .body(stream_body(reader, 0, meta.len, ()))
        }
    };
    response.map_err(|e| ApiError::Internal(e.to_string()))
}

/// Last path segment, used as the download file name.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string())
}

/// `Content-Disposition` value for an attachment.
///
/// Names that are not plain ASCII get an ASCII fallback plus an RFC 5987
/// `filename*` parameter.
pub fn content_disposition(name: &str) -> HeaderValue {
    let plain = name
        .chars()
        .all(|c| c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ');
    let value = if plain {
        format!("attachment; filename=\"{}\"", name)
    } else {
        let fallback: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || ".-_ ".contains(c) { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(name)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Cache validators for one file.
struct Validators {
    etag: String,
    last_modified: Option<String>,
    modified_secs: Option<u64>,
}

impl Validators {
    fn new(meta: &EntryMetadata) -> Self {
        let modified_secs = meta
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        Self {
            etag: format!("\"{:x}-{:x}\"", modified_secs.unwrap_or(0), meta.len),
            last_modified: modified_secs
                .map(|secs| fmt_http_date(UNIX_EPOCH + Duration::from_secs(secs))),
            modified_secs,
        }
    }

    /// `If-None-Match` wins over `If-Modified-Since` when both are sent.
    fn not_modified(&self, request: &HeaderMap) -> bool {
        if let Some(value) = header_str(request, header::IF_NONE_MATCH) {
            return value.split(',').map(str::trim).any(|tag| {
                tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == self.etag
            });
        }
        match (header_str(request, header::IF_MODIFIED_SINCE), self.modified_secs) {
            (Some(value), Some(modified)) => parse_http_date(value)
                .ok()
                .and_then(|since| since.duration_since(UNIX_EPOCH).ok())
                .is_some_and(|since| modified <= since.as_secs()),
            _ => false,
        }
    }

    /// A `Range` is honored only if `If-Range` is absent or still matches.
    fn if_range_matches(&self, request: &HeaderMap) -> bool {
        match header_str(request, header::IF_RANGE) {
            None => true,
            Some(value) if value.starts_with('"') => value == self.etag,
            Some(value) => match (parse_http_date(value).ok().and_then(secs_since_epoch), self.modified_secs) {
                (Some(since), Some(modified)) => since == modified,
                _ => false,
            },
        }
    }
}

fn secs_since_epoch(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse a single `bytes=` range against a file of `len` bytes.
///
/// Syntactically invalid and multi-range headers are ignored (full body).
/// Ranges that start past the end are unsatisfiable.
fn parse_range(value: Option<&HeaderValue>, len: u64) -> Result<Option<(u64, u64)>, ApiError> {
    let Some(spec) = value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().strip_prefix("bytes="))
    else {
        return Ok(None);
    };
    if spec.contains(',') {
        return Ok(None);
    }
    let Some((first, last)) = spec.trim().split_once('-') else {
        return Ok(None);
    };

    if first.is_empty() {
        let Ok(suffix) = last.parse::<u64>() else {
            return Ok(None);
        };
        if suffix == 0 || len == 0 {
            return Err(ApiError::RangeNotSatisfiable(len));
        }
        return Ok(Some((len.saturating_sub(suffix), len - 1)));
    }

    let Ok(start) = first.parse::<u64>() else {
        return Ok(None);
    };
    let end = if last.is_empty() {
        len.saturating_sub(1)
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => end.min(len.saturating_sub(1)),
            _ => return Ok(None),
        }
    };
    if start >= len {
        return Err(ApiError::RangeNotSatisfiable(len));
    }
    Ok(Some((start, end)))
}
