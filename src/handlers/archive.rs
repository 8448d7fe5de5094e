//! `GET /download_zip`
//!
//! # Data Flow
//! ```text
//! path ──▶ safe_path ──▶ file? ──yes──▶ plain download
//!                          │
//!                          no
//!                          ▼
//!                  build_archive (staging dir)
//!                          ▼
//!                stream zip ──▶ staging dir dropped
//! ```
//!
//! The staged archive travels with the response body and is dropped once
//! the body is finished or abandoned, which removes the staging directory.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};

use super::download::{content_disposition, file_name, file_response, Disposition};
use super::{blocking, PathQuery};
use crate::archive::build_archive;
use crate::http::response::{stream_body, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn download_zip(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    blocking(move || {
        let fs = state.fs.as_ref();
        let target = state.root.safe_path(fs, &query.path)?;
        let meta = fs.metadata(&target)?;

        if meta.is_file() {
            let name = file_name(&target);
            return file_response(fs, &target, Disposition::Attachment(&name), &headers);
        }
        if !meta.is_dir() {
            return Err(ApiError::NotFound);
        }

        let name = if target == state.root.path() {
            state.root.name()
        } else {
            file_name(&target)
        };

        let archive = match build_archive(fs, &target, &state.archive) {
            Ok(archive) => archive,
            Err(e) => {
                metrics::record_archive("failed", None);
                return Err(e.into());
            }
        };
        metrics::record_archive("built", Some(archive.byte_len()));
        tracing::info!(
            path = %state.root.relative(&target),
            entries = archive.entries(),
            bytes = archive.byte_len(),
            "streaming archive"
        );

        let file = archive.open()?;
        let len = archive.byte_len();
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/zip")
            .header(header::CONTENT_LENGTH, len)
            .header(
                header::CONTENT_DISPOSITION,
                content_disposition(&format!("{}.zip", name)),
            )
            .body(stream_body(Box::new(file), 0, len, archive))
            .map_err(|e| ApiError::Internal(e.to_string()))
    })
    .await
}
