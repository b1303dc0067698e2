/// Request extractors with JSON error bodies
///
/// Axum's own `Json` and `Path` reject bad input with a plain-text body and
/// a 415/422 status. These wrappers route the rejection through [`ApiError`]
/// so clients always get a 400 with the usual error envelope.
///
/// # Example
///
/// ```no_run
/// use projecthub_api::extract::{AppJson, AppPath};
/// use projecthub_api::error::ApiResult;
///
/// async fn handler(AppPath(id): AppPath<i64>, AppJson(body): AppJson<serde_json::Value>) -> ApiResult<()> {
///     Ok(())
/// }
/// ```

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON body extractor; rejections become `400 bad_request`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameter extractor; rejections become `400 bad_request`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);
