use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid TECSUP token")]
    InvalidToken,

    #[error("Only student accounts can sync with TECSUP")]
    IneligibleAccount,

    #[error("No TECSUP token stored; enable sync first")]
    NoStoredToken,

    #[error("Protected record: {0}")]
    ProtectedRecord(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden | AppError::IneligibleAccount | AppError::ProtectedRecord(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::InvalidToken => StatusCode::BAD_REQUEST,
            AppError::NoStoredToken => StatusCode::CONFLICT,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable name, sent as `error` in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Migration(_) => "database_error",
            AppError::NotFound => "not_found",
            AppError::Forbidden => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::BadRequest(_) => "bad_request",
            AppError::InvalidToken => "invalid_token",
            AppError::IneligibleAccount => "ineligible_account",
            AppError::NoStoredToken => "no_stored_token",
            AppError::ProtectedRecord(_) => "protected_record",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::Config(_) | AppError::InternalServerError => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                error!("database error: {}", e);
                "Database error occurred".to_string()
            }
            AppError::Migration(e) => {
                error!("migration error: {}", e);
                "Database error occurred".to_string()
            }
            AppError::UpstreamUnavailable(msg) => {
                error!("upstream unavailable: {}", msg);
                self.to_string()
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::NotFound => "Not Found".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}
