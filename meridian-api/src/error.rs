use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meridian_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    ValidationError { field: Option<String>, message: String },
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidContext { field, message } => Self::ValidationError {
                field: Some(field.to_string()),
                message: format!("{} {}", field, message),
            },
            CoreError::NotFound(what) => Self::NotFoundError(format!("{} not found", what)),
            err @ (CoreError::UpstreamUnavailable(_) | CoreError::CacheUnavailable(_)) => {
                Self::ServiceUnavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, field) = match self {
            AppError::ValidationError { field, message } => (StatusCode::BAD_REQUEST, message, field),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg, None)
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
        };

        let body = Json(json!({
            "error": error_message,
            "field": field,
        }));

        (status, body).into_response()
    }
}
