//! Shared-secret authentication gate.
//!
//! Every protected route passes through [`require_basic_auth`] before its
//! handler runs. Only the password half of the Basic credential is checked.

pub mod basic;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::http::RequestIdExt;
use crate::observability::metrics;

pub use basic::{authorize, AuthFailure, Credentials};

pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match authorize(request.headers(), &state.config.auth.secret) {
        Ok(credentials) => {
            tracing::debug!(
                request_id = %request.request_id(),
                user = %credentials.username,
                "authenticated"
            );
            next.run(request).await
        }
        Err(failure) => {
            tracing::warn!(
                request_id = %request.request_id(),
                path = %request.uri().path(),
                reason = %failure,
                "authentication failed"
            );
            metrics::record_auth_failure(failure.reason());
            challenge(&state.config.auth.realm)
        }
    }
}

/// 401 response carrying a Basic challenge for `realm`.
pub fn challenge(realm: &str) -> Response {
    let value = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, value)],
        "Authentication required",
    )
        .into_response()
}
