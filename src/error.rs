use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Backend error: {0}")]
    Webhook(#[from] crate::services::webhook_client::WebhookError),

    #[error("Token error: {0}")]
    Token(#[from] crate::auth::token::TokenError),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    InternalError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotAuthenticated => {
                return axum::response::Redirect::to("/login").into_response()
            }
            AppError::Token(_) => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Webhook(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Session(_) | AppError::Template(_) | AppError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, error_message).into_response()
    }
}
