//! Error taxonomy for the API
//!
//! Every handler returns `Result<_, AppError>`. The conversion to an HTTP
//! response happens once, in the `IntoResponse` impl below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::swap::SwapError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed field, invalid enum value
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid/expired token or wrong credentials
    #[error("{0}")]
    Authentication(String),

    /// Authenticated, but the role does not allow the action
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    /// Operation not allowed in the current state of the document
    #[error(transparent)]
    IllegalState(#[from] SwapError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Store(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Credential(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

macro_rules! store_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    AppError::Store(redb::Error::from(err))
                }
            }
        )*
    };
}

store_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Authorization(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Authentication(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::IllegalState(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Store(_)
            | AppError::Serialization(_)
            | AppError::Credential(_)
            | AppError::Token(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            if cfg!(debug_assertions) {
                json!({ "message": "Server error", "error": self.to_string() })
            } else {
                json!({ "message": "Server error" })
            }
        } else {
            json!({ "message": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}
