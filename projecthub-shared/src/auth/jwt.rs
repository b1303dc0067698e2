/// JWT token generation and validation module
///
/// Identity tokens are signed with HS256 and carry the caller's
/// `{id, username, email}` triple so protected handlers never need a user
/// lookup to know who is calling.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours by default, configurable per issuer
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use projecthub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use projecthub_shared::auth::middleware::Identity;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = Identity {
///     id: 1,
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
/// };
///
/// let claims = Claims::new(&identity);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, identity.id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::middleware::Identity;

/// Issuer written into and required from every token
pub const ISSUER: &str = "projecthub";

/// Default token lifetime in hours
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "projecthub")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `username`, `email`: the rest of the caller identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: i64,

    /// Username at the time the token was issued
    pub username: String,

    /// Email at the time the token was issued
    pub email: String,

    /// Issuer - Always "projecthub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for `identity` with the default 24 hour expiration
    pub fn new(identity: &Identity) -> Self {
        Self::with_expiration(identity, Duration::hours(DEFAULT_EXPIRATION_HOURS))
    }

    /// Creates claims with a custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use projecthub_shared::auth::jwt::Claims;
    /// use projecthub_shared::auth::middleware::Identity;
    /// use chrono::Duration;
    ///
    /// let identity = Identity {
    ///     id: 7,
    ///     username: "bob".to_string(),
    ///     email: "bob@example.com".to_string(),
    /// };
    /// let claims = Claims::with_expiration(&identity, Duration::hours(1));
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(identity: &Identity, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }

    /// The caller identity carried by these claims
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 (HMAC-SHA256) with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token creation fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a signed identity token valid for `expiration_hours`
pub fn issue_token(
    identity: &Identity,
    secret: &str,
    expiration_hours: i64,
) -> Result<String, JwtError> {
    let claims = Claims::with_expiration(identity, Duration::hours(expiration_hours));
    create_token(&claims, secret)
}

/// Validates a JWT token and extracts claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired
/// - Issuer is "projecthub"
/// - Token is not used before nbf time
///
/// # Errors
///
/// Returns error if:
/// - Signature is invalid
/// - Token has expired
/// - Issuer doesn't match
/// - Token format is invalid
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // Expiry is exact: a token is dead the second `exp` passes.
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and returns the identity it carries
pub fn verify_token(token: &str, secret: &str) -> Result<Identity, JwtError> {
    validate_token(token, secret).map(|claims| claims.identity())
}
