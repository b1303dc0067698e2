/// Bearer authentication for Axum
///
/// Turns an `Authorization: Bearer <token>` header into the caller's
/// [`Identity`]. The API crate runs [`authenticate`] in a route layer and
/// inserts the identity into the request extensions, where handlers pick it
/// up with `Extension<Identity>`.
///
/// # Failure modes
///
/// | Situation                                        | Error                          |
/// |--------------------------------------------------|--------------------------------|
/// | No `Authorization` header                        | [`AuthError::MissingToken`]    |
/// | Not exactly `Bearer <token>` (two parts)         | [`AuthError::MalformedHeader`] |
/// | Signature, expiry or issuer check fails          | [`AuthError::InvalidToken`]    |
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use projecthub_shared::auth::middleware::{authenticate, AuthError};
///
/// let headers = HeaderMap::new();
/// assert!(matches!(authenticate(&headers, "secret"), Err(AuthError::MissingToken)));
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
/// assert!(matches!(authenticate(&headers, "secret"), Err(AuthError::MalformedHeader)));
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use super::jwt::verify_token;

/// The authenticated caller
///
/// Decoded from a verified token and handed to every protected handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub id: i64,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Authorization header absent
    #[error("No token provided")]
    MissingToken,

    /// Authorization header present but not `Bearer <token>`
    #[error("Token error")]
    MalformedHeader,

    /// Token failed verification
    #[error("Invalid token")]
    InvalidToken,
}

/// Extracts the raw token from the `Authorization` header
///
/// The header must split on single spaces into exactly two parts, the first
/// being `Bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// See the module-level table.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Identity, AuthError> {
    let token = bearer_token(headers)?;

    verify_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AuthError::InvalidToken
    })
}
