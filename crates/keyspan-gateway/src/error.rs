use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyspan_shortener::ShortenerError;
use thiserror::Error;
use tracing::error;

use crate::model::MessageResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Shortener(err) => match err {
                ShortenerError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
                ShortenerError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                ShortenerError::AllocationFailed(_)
                | ShortenerError::CreateFailed(_)
                | ShortenerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest(reason) => reason.clone(),
            AppError::Shortener(err) => match err {
                ShortenerError::InvalidUrl(reason) => format!("invalid long url: {reason}"),
                ShortenerError::NotFound(_) => "short url not found".to_string(),
                ShortenerError::Cancelled => "request cancelled".to_string(),
                ShortenerError::AllocationFailed(_) | ShortenerError::CreateFailed(_) => {
                    "failed to create url".to_string()
                }
                ShortenerError::Storage(_) => "storage unavailable".to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(MessageResponse::new(self.message()))).into_response()
    }
}
