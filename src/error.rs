//! Error types for EquipTrack server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// One entry of a serial-number validation report.
///
/// `index` is the position of the serial number in the submitted batch.
/// Structural failures (unknown equipment type, empty batch) use index 0
/// with an empty `serial_number`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SerialNumberError {
    pub index: usize,
    pub serial_number: String,
    pub error: Vec<String>,
}

/// Per-item validation report returned by bulk registration and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SerialNumberReport {
    pub serial_numbers_errors: Vec<SerialNumberError>,
}

impl SerialNumberReport {
    /// Report for a failure that is not tied to any particular serial number.
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            serial_numbers_errors: vec![SerialNumberError {
                index: 0,
                serial_number: String::new(),
                error: vec![message.into()],
            }],
        }
    }

    pub fn push(&mut self, index: usize, serial_number: &str, error: Vec<String>) {
        self.serial_numbers_errors.push(SerialNumberError {
            index,
            serial_number: serial_number.to_string(),
            error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.serial_numbers_errors.is_empty()
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Per-item serial-number validation report (bad input, 400).
    #[error("Serial number validation failed")]
    SerialNumbers(SerialNumberReport),

    /// A mask contains an unrecognized class character. This is a
    /// configuration defect in the equipment type, not a user input error.
    #[error("Invalid serial number mask: {0}")]
    InvalidMask(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for non-report errors
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::SerialNumbers(report) => {
                return (StatusCode::BAD_REQUEST, Json(report)).into_response();
            }
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "authentication", msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::InvalidMask(msg) => {
                tracing::error!("Invalid serial number mask: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "invalid_mask",
                    "Equipment type has an invalid serial number mask".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database",
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
