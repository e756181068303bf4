use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("The store is temporarily unavailable. Please try again.")]
    RemoteUnavailable,

    #[error("Your cart is no longer available")]
    CartNotFound,

    #[error("Cart line not found")]
    LineNotFound,

    #[error("Unknown product variant")]
    InvalidVariant,

    #[error("Cart not initialized")]
    CartNotInitialized,

    #[error("{0}")]
    CouponNotApplicable(String),

    #[error("Validation Error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<CommerceError> for AppError {
    fn from(err: CommerceError) -> Self {
        match err {
            CommerceError::Http(_) | CommerceError::Status(_) | CommerceError::Cancelled => {
                AppError::RemoteUnavailable
            }
            CommerceError::GraphQL(message) => AppError::BadRequest(message),
            CommerceError::Malformed(message) => {
                AppError::Internal(anyhow::anyhow!("malformed commerce response: {message}"))
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::RemoteUnavailable => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::CartNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::LineNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidVariant => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::CartNotInitialized => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::CouponNotApplicable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = ApiResponse {
            message,
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
