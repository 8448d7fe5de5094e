//! Response handling.
//!
//! # Responsibilities
//! - Map domain errors to HTTP status codes and JSON error bodies
//! - Stream file content to the client without buffering it whole
//!
//! # Design Decisions
//! - Internal error details are logged, never sent to the client
//! - Bodies are fed by a blocking pump over a bounded channel; a full
//!   channel pauses the pump, a dropped receiver stops it
//! - Each in-flight body holds one blocking-pool thread until it finishes,
//!   so concurrent downloads are bounded by the runtime's blocking pool

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::stream;
use std::io::{self, SeekFrom};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::archive::ArchiveError;
use crate::storage::{ReadSeek, StorageError};

/// Size of each chunk sent to the client.
pub const CHUNK_SIZE: usize = 64 * 1024;

const CHANNEL_CAPACITY: usize = 4;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unsafe path")]
    UnsafePath,

    #[error("not found")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error("{0} not found")]
    IndexMissing(String),

    #[error("range not satisfiable")]
    RangeNotSatisfiable(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsafePath | ApiError::NotADirectory => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::IndexMissing(_) => StatusCode::NOT_FOUND,
            ApiError::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::IndexMissing(name) => (status, format!("{} not found", name)).into_response(),
            ApiError::RangeNotSatisfiable(len) => {
                let mut response =
                    (status, Json(serde_json::json!({ "error": "range not satisfiable" })))
                        .into_response();
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", len)) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                response
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (status, Json(serde_json::json!({ "error": "internal error" }))).into_response()
            }
            other => (status, Json(serde_json::json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::UnsafePath => ApiError::UnsafePath,
            StorageError::NotADirectory => ApiError::NotADirectory,
            e if e.is_not_found() => ApiError::NotFound,
            StorageError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error).into()
    }
}

impl From<ArchiveError> for ApiError {
    fn from(error: ArchiveError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {}", error))
    }
}

/// Stream `len` bytes of `reader`, starting at `offset`, as a response body.
///
/// `guard` is released after the reader is closed and before the stream
/// ends, whether the client read everything, hung up, or a read failed.
pub fn stream_body<G>(reader: Box<dyn ReadSeek>, offset: u64, len: u64, guard: G) -> Body
where
    G: Send + 'static,
{
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let mut reader = reader;
        if let Err(e) = pump(reader.as_mut(), offset, len, &tx) {
            tracing::warn!(error = %e, "response body aborted");
            let _ = tx.blocking_send(Err(e));
        }
        drop(reader);
        drop(guard);
        drop(tx);
    });

    Body::from_stream(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    }))
}

fn pump(
    reader: &mut dyn ReadSeek,
    offset: u64,
    len: u64,
    tx: &mpsc::Sender<io::Result<Bytes>>,
) -> io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        let n = reader.read(&mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shrank while streaming",
            ));
        }
        remaining -= n as u64;

        if tx.blocking_send(Ok(Bytes::copy_from_slice(&buf[..n]))).is_err() {
            tracing::debug!(remaining, "client went away mid-stream");
            return Ok(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Flag(Arc<AtomicBool>);

    impl Drop for Flag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn streams_requested_slice_and_releases_guard() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let released = Arc::new(AtomicBool::new(false));

        let body = stream_body(
            Box::new(Cursor::new(data.clone())),
            10,
            150_000,
            Flag(released.clone()),
        );
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

        assert_eq!(&bytes[..], &data[10..150_010]);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn short_file_is_an_error() {
        let body = stream_body(Box::new(Cursor::new(vec![1u8; 10])), 0, 20, ());
        assert!(axum::body::to_bytes(body, usize::MAX).await.is_err());
    }

    #[test]
    fn storage_errors_map_to_statuses() {
        let not_found = StorageError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(ApiError::from(not_found).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StorageError::UnsafePath).status(), StatusCode::BAD_REQUEST);
        let denied = StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert_eq!(
            ApiError::from(denied).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
