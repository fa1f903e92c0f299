//! API error type and JSON error envelope
//!
//! Lower-layer errors are logged where they are converted; the client only
//! ever sees a code and a generic message.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::db::DbError;
use crate::domain::ValidationError;
use crate::images::migrate::MigrationError;
use crate::images::{ResolveError, UploadError};

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    /// Machine readable code, e.g. `VALIDATION_ERROR`
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("No file provided")]
    MissingFile,
    #[error("Only image files are allowed")]
    UnsupportedType,
    #[error("File exceeds the upload limit of {0} bytes")]
    FileTooLarge(usize),
    #[error("{0}")]
    NotFound(String),
    #[error("Database operation failed")]
    Database,
    #[error("Image upload failed")]
    UploadFailed,
    #[error("Image storage unavailable")]
    Storage,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::MissingFile => "MISSING_FILE",
            ApiError::UnsupportedType => "UNSUPPORTED_TYPE",
            ApiError::FileTooLarge(_) => "FILE_TOO_LARGE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Database => "DATABASE_ERROR",
            ApiError::UploadFailed => "UPLOAD_FAILED",
            ApiError::Storage => "STORAGE_ERROR",
        }
    }

    pub fn product_not_found(id: i32) -> Self {
        ApiError::NotFound(format!("Product {} not found", id))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MissingFile | ApiError::UnsupportedType => StatusCode::BAD_REQUEST,
            ApiError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database | ApiError::UploadFailed | ApiError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error: self.code().to_string(),
            message: self.to_string(),
        })
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        error!(error = %err, "Product store operation failed");
        ApiError::Database
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile => ApiError::MissingFile,
            UploadError::UnsupportedType(_) => ApiError::UnsupportedType,
            UploadError::TooLarge { max, .. } => ApiError::FileTooLarge(max),
            UploadError::ProductNotFound(id) => ApiError::product_not_found(id),
            UploadError::Storage(e) => {
                error!(error = %e, "Image upload failed");
                ApiError::UploadFailed
            }
            UploadError::Store(e) => e.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(_) => ApiError::NotFound("Image not found".to_string()),
            ResolveError::Store(e) => e.into(),
            ResolveError::Storage(e) => {
                error!(error = %e, "Image read failed");
                ApiError::Storage
            }
        }
    }
}

impl From<MigrationError> for ApiError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Store(e) => e.into(),
        }
    }
}
