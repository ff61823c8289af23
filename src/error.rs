use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Unified application error type that maps to JSON HTTP responses.
///
/// Body format: `{ "error": "<CODE>", "message": "...", "details": [...] }`, where
/// `details` is only present for validation failures.
#[derive(Debug)]
pub enum AppError {
    /// 400 Bad Request
    BadRequest(String),
    /// 400 Bad Request carrying one message per failed field check
    Validation(Vec<String>),
    /// 401 Unauthorized
    Unauthorized(String),
    /// 403 Forbidden
    Forbidden(String),
    /// 404 Not Found
    NotFound(String),
    /// 409 Conflict
    Conflict(String),
    /// 500 Internal Server Error (wraps any error, logs details, returns generic message)
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl AppError {
    /// Status code this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a rejected status change.
    #[must_use]
    pub fn invalid_transition(
        entity: &str,
        from: impl std::fmt::Debug,
        to: impl std::fmt::Debug,
    ) -> Self {
        Self::Conflict(format!("Cannot move {entity} from {from:?} to {to:?}."))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(message) => ErrorBody {
                error: "BAD_REQUEST",
                message,
                details: None,
            },
            Self::Validation(details) => ErrorBody {
                error: "VALIDATION_ERROR",
                message: "Validation failed.".to_string(),
                details: Some(details),
            },
            Self::Unauthorized(message) => ErrorBody {
                error: "UNAUTHORIZED",
                message,
                details: None,
            },
            Self::Forbidden(message) => ErrorBody {
                error: "FORBIDDEN",
                message,
                details: None,
            },
            Self::NotFound(message) => ErrorBody {
                error: "NOT_FOUND",
                message,
                details: None,
            },
            Self::Conflict(message) => ErrorBody {
                error: "CONFLICT",
                message,
                details: None,
            },
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                ErrorBody {
                    error: "INTERNAL_ERROR",
                    message: "An internal error occurred".to_string(),
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Allow `?` to automatically convert any `anyhow::Error` into `AppError::Internal`.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn validation_errors_carry_details() {
        let (status, json) = body_json(AppError::Validation(vec![
            "Email is required.".to_string(),
            "Password must be at least 8 characters.".to_string(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "VALIDATION_ERROR");
        assert_eq!(json["details"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() {
        let (status, json) = body_json(AppError::from(anyhow::anyhow!("db exploded"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "An internal error occurred");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::Unauthorized(String::new()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Conflict(String::new()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
    }
}
