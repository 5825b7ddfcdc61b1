use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        assignment_ids: Vec<Uuid>,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state transition: {0}")]
    State(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Storage temporarily unavailable: {0}")]
    Transient(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

#[derive(Debug, Serialize)]
pub struct ConflictDetails {
    pub assignment_ids: Vec<Uuid>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::State(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        } else {
            log::warn!(
                "Request rejected with status {}: {}",
                status_code,
                error_message
            );
        }

        match self {
            AppError::Conflict { assignment_ids, .. } => {
                let details = ConflictDetails {
                    assignment_ids: assignment_ids.clone(),
                };
                HttpResponse::build(status_code)
                    .json(ApiResponse::error_with_data(details, &error_message))
            }
            _ => HttpResponse::build(status_code).json(ApiResponse::<()>::error(&error_message)),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if is_transient(&error) {
            log::warn!("Transient database error: {}", error);
            return AppError::Transient(error.to_string());
        }

        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

/// SQLite busy/locked results and pool timeouts are worth one more attempt.
fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_error) => db_error
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            // Extended result codes carry the primary code in the low byte.
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    }
}

impl AppError {
    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn conflict(message: impl Into<String>, assignment_ids: Vec<Uuid>) -> Self {
        AppError::Conflict {
            message: message.into(),
            assignment_ids,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::from(sqlx_err),
            Err(original_error) => AppError::InternalServerError(Some(original_error.to_string())),
        }
    }
}
