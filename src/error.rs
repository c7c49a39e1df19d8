use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::debug;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {0} ID")]
    InvalidId(&'static str),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidId(_) | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        debug!("Responding {}: {}", status, self);
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
