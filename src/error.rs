use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::{config::ConfigError, serializers::ValidationError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing or invalid fields")]
    InvalidFields,

    #[error("Internal server error")]
    Internal(#[from] StoreError),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        debug!("Rejected submission: {err}");

        match err {
            ValidationError::Malformed(_) | ValidationError::NotAnObject => AppError::InvalidJson,
            _ => AppError::InvalidFields,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidJson | AppError::InvalidFields => StatusCode::BAD_REQUEST,
            AppError::Internal(err) => {
                error!("Storage failure: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failures that stop the process before or while serving.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("storage: {0}")]
    Store(#[from] StoreError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
