//! Error type shared by the upload, detection and HTTP layers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::views;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The upload request carried no `file` part. Expected, not exceptional.
    #[error("No file uploaded")]
    NoFileProvided,

    /// The label-detection call failed. Carries the underlying message verbatim.
    #[error("{0}")]
    ExternalService(String),

    #[error("Not Found")]
    RouteNotFound,

    /// The upload body could not be read; keeps the status the extractor chose
    /// (413 for an oversized body, 400 for a malformed one).
    #[error("{message}")]
    Upload { status: StatusCode, message: String },

    #[error("{0}")]
    Unhandled(String),

    /// Startup configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoFileProvided => StatusCode::BAD_REQUEST,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::Upload { status, .. } => *status,
            AppError::ExternalService(_) | AppError::Unhandled(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl AppError {
    /// Server-side failures go to the error log; client mistakes do not.
    pub fn trace(&self) {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Upload {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.trace();
        match self {
            AppError::NoFileProvided => views::no_file_page(),
            other => (other.status(), views::error_fragment(&other.to_string())).into_response(),
        }
    }
}
