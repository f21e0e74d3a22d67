//! Request handler errors and their HTTP mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The request body could not be read as a form.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The uploaded document could not be parsed.
    #[error("unreadable document: {0}")]
    Document(#[from] fontpush_core::Error),

    /// The storage service rejected an upload.
    #[error("upload failed: {0}")]
    Remote(#[from] fontpush_remote::RemoteError),

    /// Local file handling failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal_server_error<E: std::fmt::Display>(err: E) -> Self {
        AppError::Internal(err.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Document(_)
            | AppError::Remote(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
