use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid rental window: {field}")]
    InvalidWindow { field: &'static str },

    #[error("booking creation failed: {0}")]
    BookingCreationFailed(String),

    #[error("cannot cancel a booking in status '{from}'")]
    IllegalTransition { from: &'static str },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized { redirect_to: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidWindow { field } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "error": self.to_string(), "field": field }),
            ),
            AppError::BookingCreationFailed(_) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::IllegalTransition { from } => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": self.to_string(), "status": from }),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Unauthorized { redirect_to } => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "unauthorized", "redirect_to": redirect_to }),
            ),
            AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": self.to_string() }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
