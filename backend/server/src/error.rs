use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("No report available, verify a PRN first")]
    NoReport,

    #[error("A submission is already in progress")]
    SubmissionPending,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload | AppError::UnknownField(_) => StatusCode::BAD_REQUEST,
            AppError::NoReport => StatusCode::NOT_FOUND,
            AppError::SubmissionPending => StatusCode::CONFLICT,
        };

        (status, self.to_string()).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build collaborator: {0}")]
    Collaborator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
