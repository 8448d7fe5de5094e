//! `GET /` serves the configured index page from the root.

use axum::{extract::State, http::HeaderMap, response::Response};

use super::blocking;
use super::download::{file_response, Disposition};
use crate::http::response::ApiError;
use crate::http::server::AppState;

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    blocking(move || {
        let fs = state.fs.as_ref();
        let index_file = &state.config.storage.index_file;
        let missing = || ApiError::IndexMissing(index_file.clone());

        let path = state.root.safe_path(fs, index_file).map_err(|_| missing())?;
        match fs.metadata(&path) {
            Ok(meta) if meta.is_file() => file_response(fs, &path, Disposition::Inline, &headers),
            _ => Err(missing()),
        }
    })
    .await
}
