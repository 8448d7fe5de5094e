//! Request handlers for the file routes.
//!
//! # Responsibilities
//! - Resolve the `path` query against the served root
//! - Run filesystem work off the async runtime
//! - Shape listings, file bodies and archives into responses
//!
//! # Design Decisions
//! - Handlers take `&dyn Vfs` so the whole surface runs against an in-memory
//!   tree in tests
//! - A missing `path` query means the root itself

pub mod archive;
pub mod download;
pub mod index;
pub mod listing;

use serde::Deserialize;

use crate::http::response::ApiError;

pub use archive::download_zip;
pub use download::download;
pub use index::index;
pub use listing::list;

/// `?path=` as sent by every file route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

/// Run blocking filesystem work on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
