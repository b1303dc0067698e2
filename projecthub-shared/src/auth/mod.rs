/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: identity token issuing and validation
/// - [`middleware`]: bearer header parsing and the [`middleware::Identity`] type
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::auth::password::{hash_password, verify_password};
/// use projecthub_shared::auth::jwt::{issue_token, verify_token};
/// use projecthub_shared::auth::middleware::Identity;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let identity = Identity { id: 1, username: "alice".into(), email: "a@x.com".into() };
/// let token = issue_token(&identity, "secret-key", 24)?;
/// assert_eq!(verify_token(&token, "secret-key")?, identity);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
