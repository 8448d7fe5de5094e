//! `GET /api/list`

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{blocking, PathQuery};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::storage::{Root, Vfs};

/// One child of a listed directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    /// Byte length; `null` for anything that is not a regular file.
    pub size: Option<u64>,
    /// Root-relative path with `/` separators.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListResponse {
    pub path: String,
    pub items: Vec<DirEntryInfo>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let listing = blocking(move || list_directory(state.fs.as_ref(), &state.root, &query.path)).await?;
    Ok(Json(listing))
}

/// List the immediate children of `requested`, sorted by name.
pub fn list_directory(fs: &dyn Vfs, root: &Root, requested: &str) -> Result<ListResponse, ApiError> {
    let dir = root.safe_path(fs, requested)?;
    if !fs.metadata(&dir)?.is_dir() {
        return Err(ApiError::NotADirectory);
    }

    let mut names = fs.read_dir(&dir)?;
    names.sort();

    let items = names
        .into_iter()
        .map(|name| {
            let full = dir.join(&name);
            // Dangling symlinks and the like are listed without details.
            let meta = fs.metadata(&full).ok();
            DirEntryInfo {
                is_dir: meta.is_some_and(|m| m.is_dir()),
                size: meta.filter(|m| m.is_file()).map(|m| m.len),
                path: root.relative(&full),
                name,
            }
        })
        .collect();

    Ok(ListResponse {
        path: root.relative(&dir),
        items,
    })
}
