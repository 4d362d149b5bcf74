use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finapp_core::FinError;
use finapp_import::CsvError;
use finapp_storage::AttachmentError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] FinError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Statement(#[from] CsvError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("E-mail already registered")]
    EmailTaken,

    #[error("Name already exists")]
    Duplicate,

    #[error("Invalid e-mail or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Domain(FinError::NotReconcilable(_)) => StatusCode::NOT_FOUND,
            AppError::Domain(_) | AppError::Statement(_) | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Attachment(AttachmentError::NotAllowed(_) | AttachmentError::Empty) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Attachment(AttachmentError::NotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailTaken | AppError::Duplicate => StatusCode::CONFLICT,
            AppError::Database(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                StatusCode::CONFLICT
            }
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Attachment(AttachmentError::Io(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
            "Internal server error".to_string()
        } else if let AppError::Database(_) = self {
            "Conflicting record".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
