use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::types::import::ActivityId;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid GPX: {0}")]
    InvalidGpx(String),
    #[error("No track found in GPX file")]
    MissingTrack,
    #[error("Invalid FIT: {0}")]
    InvalidFit(String),
    #[error("Invalid gzip payload: {0}")]
    InvalidGzip(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported file type: {0}. Please upload a GPX, FIT, or gzipped FIT file.")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Failed to extract: {0}")]
    Extraction(#[from] std::io::Error),
    #[error("Duplicate activity already exists for this date and time ({0})")]
    DuplicateDetected(ActivityId),
    #[error("Failed to save activity: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("A bulk upload is already in progress for this user")]
    AlreadyRunning,
    #[error("Failed to prepare scratch storage: {0}")]
    Scratch(std::io::Error),
    #[error("Invalid archive: {0}")]
    Archive(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Bulk(#[from] BulkError),
    #[error("Activity not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Import(ImportError::UnsupportedFormat(_))
            | AppError::Import(ImportError::Decode(_))
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Import(ImportError::DuplicateDetected(_))
            | AppError::Bulk(BulkError::AlreadyRunning) => StatusCode::CONFLICT,
            AppError::Import(ImportError::Persistence(StoreError::Constraint(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Import(_) | AppError::Bulk(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
