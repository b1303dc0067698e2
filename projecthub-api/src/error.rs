/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "not_found", "message": "Proyecto no encontrado" }
/// ```
///
/// with an optional `details` array of `{field, message}` for validation
/// failures.
///
/// # Example
///
/// ```
/// use projecthub_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Tarea no encontrada".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use projecthub_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    models::{ModelError, PatchError},
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Required field missing or invalid (400)
    #[error("Validation failed: {message}")]
    ValidationError {
        message: String,
        details: Vec<ValidationErrorDetail>,
    },

    /// Unparseable request: bad JSON, wrong content type, non-numeric id (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Not found, or not owned by the caller (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate email or username (400)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Validation error for a single field
    pub fn invalid_field(field: &str, message: &str) -> Self {
        ApiError::ValidationError {
            message: message.to_string(),
            details: vec![ValidationErrorDetail {
                field: field.to_string(),
                message: message.to_string(),
            }],
        }
    }

    /// Validation error carrying every field error from `validator`
    ///
    /// Details are sorted by field name so responses are stable.
    pub fn invalid_fields(message: &str, errors: &ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError {
            message: message.to_string(),
            details,
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. }
            | ApiError::BadRequest(_)
            | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_code, message, details) = match self {
            ApiError::ValidationError { message, details } => {
                ("validation_error", message, Some(details))
            }
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "Error interno del servidor".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                if db_err.message().contains("users.email") {
                    ApiError::Conflict("Este correo electrónico ya está registrado".to_string())
                } else if db_err.message().contains("users.username") {
                    ApiError::Conflict("Este nombre de usuario ya está en uso".to_string())
                } else {
                    tracing::warn!(constraint = db_err.message(), "Unique constraint violation");
                    ApiError::Conflict("El registro ya existe".to_string())
                }
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert model errors to API errors
impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ProjectNotFound => ApiError::NotFound("Proyecto no encontrado".to_string()),
            ModelError::TaskNotFound => ApiError::NotFound("Tarea no encontrada".to_string()),
            ModelError::InvalidPatch(err) => err.into(),
            ModelError::Database(err) => err.into(),
        }
    }
}

/// Convert patch errors to API errors
impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        ApiError::invalid_field(err.field, err.message)
    }
}

/// Convert auth errors to API errors
///
/// The error's display text is the response message.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            _ => ApiError::Unauthorized(AuthError::InvalidToken.to_string()),
        }
    }
}

/// Convert JSON body rejections to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert path parameter rejections to API errors
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert blocking task failures to API errors
impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("Blocking task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Tarea no encontrada".to_string());
        assert_eq!(err.to_string(), "Not found: Tarea no encontrada");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::invalid_field("name", "required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::InternalError("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("disk"));
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let response = ApiError::invalid_field("title", "El título de la tarea es requerido")
            .into_response();
        let body = body_json(response).await;

        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "El título de la tarea es requerido");
        assert_eq!(body["details"][0]["field"], "title");
    }

    #[derive(Validate)]
    struct Form {
        #[validate(required(message = "username is required"))]
        username: Option<String>,

        #[validate(required(message = "email is required"))]
        email: Option<String>,
    }

    #[test]
    fn test_invalid_fields_sorted() {
        let errors = Form {
            username: None,
            email: None,
        }
        .validate()
        .unwrap_err();

        match ApiError::invalid_fields("Todos los campos son requeridos", &errors) {
            ApiError::ValidationError { message, details } => {
                assert_eq!(message, "Todos los campos son requeridos");
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "username"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_model_errors() {
        assert!(matches!(
            ApiError::from(ModelError::ProjectNotFound),
            ApiError::NotFound(msg) if msg == "Proyecto no encontrado"
        ));
        assert!(matches!(
            ApiError::from(ModelError::TaskNotFound),
            ApiError::NotFound(msg) if msg == "Tarea no encontrada"
        ));
    }

    #[tokio::test]
    async fn test_unique_violation_messages() {
        use sqlx::Connection;

        let mut conn = sqlx::SqliteConnection::connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE labels (name TEXT NOT NULL UNIQUE)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO labels (name) VALUES ('a')")
            .execute(&mut conn)
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO labels (name) VALUES ('a')")
            .execute(&mut conn)
            .await
            .unwrap_err();

        match ApiError::from(err) {
            ApiError::Conflict(msg) => {
                assert_eq!(msg, "El registro ya existe");
                assert!(!msg.contains("UNIQUE"));
                assert!(!msg.contains("labels"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_auth_errors_keep_message() {
        assert!(matches!(
            ApiError::from(AuthError::MissingToken),
            ApiError::Unauthorized(msg) if msg == "No token provided"
        ));
        assert!(matches!(
            ApiError::from(JwtError::Expired),
            ApiError::Unauthorized(msg) if msg == "Invalid token"
        ));
    }
}
