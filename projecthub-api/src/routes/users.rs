/// User endpoints
///
/// - `POST /api/users/register` - Register and receive a token
/// - `POST /api/users/login` - Login and receive a token
/// - `GET /api/users/profile` - The caller's own account (authenticated)
///
/// Responses never include the password hash.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use projecthub_shared::{
    auth::{jwt, middleware::Identity, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const FIELDS_REQUIRED: &str = "Todos los campos son requeridos";
const CREDENTIALS_REQUIRED: &str = "Correo electrónico y contraseña son requeridos";
const INVALID_CREDENTIALS: &str = "Credenciales inválidas";

/// Register request
///
/// Fields are optional at the type level so a missing field is reported as
/// a validation error instead of a JSON parse failure.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "El nombre de usuario es requerido"),
        length(min = 1, message = "El nombre de usuario es requerido")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "El correo electrónico es requerido"),
        length(min = 1, message = "El correo electrónico es requerido")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "La contraseña es requerida"),
        length(min = 1, message = "La contraseña es requerida")
    )]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "El correo electrónico es requerido"),
        length(min = 1, message = "El correo electrónico es requerido")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "La contraseña es requerida"),
        length(min = 1, message = "La contraseña es requerida")
    )]
    pub password: Option<String>,
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,

    /// Bearer token for subsequent requests
    pub token: String,
}

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/users/register
/// Content-Type: application/json
///
/// { "username": "alice", "email": "a@x.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: a field is missing or empty
/// - `400 conflict`: email or username already registered
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()
        .map_err(|e| ApiError::invalid_fields(FIELDS_REQUIRED, &e))?;

    let (Some(username), Some(email), Some(plain_password)) =
        (req.username, req.email, req.password)
    else {
        return Err(ApiError::invalid_field("body", FIELDS_REQUIRED));
    };

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict(
            "Este correo electrónico ya está registrado".to_string(),
        ));
    }

    if User::find_by_username(&state.db, &username).await?.is_some() {
        return Err(ApiError::Conflict(
            "Este nombre de usuario ya está en uso".to_string(),
        ));
    }

    // Argon2 is CPU-bound; keep it off the async workers
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&plain_password)).await??;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email,
            password_hash,
        },
    )
    .await?;

    let token = jwt::issue_token(
        &user.identity(),
        state.jwt_secret(),
        state.jwt_expiration_hours(),
    )?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Usuario registrado exitosamente",
            user,
            token,
        }),
    ))
}

/// Login with email and password
///
/// Unknown email and wrong password produce the same response.
///
/// # Endpoint
///
/// ```text
/// POST /api/users/login
/// Content-Type: application/json
///
/// { "email": "a@x.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: email or password missing
/// - `401 unauthorized`: invalid credentials
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()
        .map_err(|e| ApiError::invalid_fields(CREDENTIALS_REQUIRED, &e))?;

    let (Some(email), Some(plain_password)) = (req.email, req.password) else {
        return Err(ApiError::invalid_field("body", CREDENTIALS_REQUIRED));
    };

    let user = User::find_by_email(&state.db, &email).await?;

    // Unknown emails still pay for a full verification
    let stored_hash = user
        .as_ref()
        .map_or_else(|| password::DUMMY_HASH.to_string(), |u| u.password_hash.clone());
    let valid =
        tokio::task::spawn_blocking(move || password::verify_password(&plain_password, &stored_hash))
            .await??;

    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            tracing::debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        None => {
            tracing::debug!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let token = jwt::issue_token(
        &user.identity(),
        state.jwt_secret(),
        state.jwt_expiration_hours(),
    )?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Inicio de sesión exitoso",
        user,
        token,
    }))
}

/// The caller's profile
///
/// # Errors
///
/// - `404 not_found`: the account behind the token no longer exists
pub async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    Ok(Json(ProfileResponse { user }))
}
