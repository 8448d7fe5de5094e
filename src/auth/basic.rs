//! `Authorization: Basic` credential parsing.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Decoded Basic credentials. The username is carried for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("missing Authorization header")]
    Missing,

    #[error("malformed Basic credentials")]
    Malformed,

    #[error("wrong password")]
    WrongSecret,
}

impl AuthFailure {
    /// Label used in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthFailure::Missing => "missing",
            AuthFailure::Malformed => "malformed",
            AuthFailure::WrongSecret => "wrong_secret",
        }
    }
}

/// Decode the value of an `Authorization` header using the Basic scheme.
///
/// The payload is split on the first colon, so passwords may contain colons.
pub fn parse_basic(value: &str) -> Result<Credentials, AuthFailure> {
    let encoded = value
        .strip_prefix("Basic ")
        .and_then(|rest| rest.split(' ').next())
        .ok_or(AuthFailure::Malformed)?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| AuthFailure::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthFailure::Malformed)?;

    let (username, password) = decoded.split_once(':').ok_or(AuthFailure::Malformed)?;
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Accept the request iff the Basic password equals `secret`.
pub fn authorize(headers: &HeaderMap, secret: &str) -> Result<Credentials, AuthFailure> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthFailure::Missing)?
        .to_str()
        .map_err(|_| AuthFailure::Malformed)?;

    let credentials = parse_basic(value)?;
    if constant_time_eq(&credentials.password, secret) {
        Ok(credentials)
    } else {
        Err(AuthFailure::WrongSecret)
    }
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
