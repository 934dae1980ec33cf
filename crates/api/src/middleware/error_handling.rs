//! # Error Handling Middleware
//!
//! Maps [`TimeError`] to HTTP status codes and JSON error bodies so every
//! handler reports failures the same way.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use classcal_core::errors::TimeError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// ```
/// use axum::Json;
/// use classcal_api::middleware::error_handling::AppError;
/// use classcal_core::errors::TimeError;
///
/// async fn handler(found: bool) -> Result<Json<&'static str>, AppError> {
///     if !found {
///         return Err(AppError(TimeError::NotFound("Class not found".into())));
///     }
///     Ok(Json("ok"))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub TimeError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TimeError::NotFound(_) => StatusCode::NOT_FOUND,
            TimeError::Validation(_) => StatusCode::BAD_REQUEST,
            TimeError::Conflict(_) => StatusCode::CONFLICT,
            TimeError::Swap(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TimeError::Database(_) | TimeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self.0);
        }

        let body = match &self.0 {
            // swap conflicts carry the teacher, day and time for the UI
            TimeError::Swap(conflict) => json!({
                "error": message,
                "conflict": conflict,
            }),
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<TimeError> for AppError {
    fn from(err: TimeError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(TimeError::Database(err))
    }
}

impl From<classcal_core::swap::SwapError> for AppError {
    fn from(err: classcal_core::swap::SwapError) -> Self {
        AppError(TimeError::Swap(err))
    }
}

/// Maps a TimeError to an HTTP response
pub fn map_error(err: TimeError) -> Response {
    AppError(err).into_response()
}
