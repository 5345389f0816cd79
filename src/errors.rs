// src/errors.rs
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid JSON format in request body or missing body.")]
    BadJson,

    #[error("Invalid OTP code.")]
    InvalidOtp,

    #[error("OTP not found or expired.")]
    OtpNotFound,

    #[error("The email address is not registered for password reset.")]
    EmailNotRegistered,

    #[error("Reset token is missing, invalid, or already used.")]
    InvalidResetToken,

    #[error("Authentication Failed. Check if MAIL_PASS is the correct App Password.")]
    MailAuth,

    #[error("Email failed. Check MAIL_PASS (App Password) and 2FA set.")]
    MailDelivery,

    #[error("{0}")]
    Provider(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadJson => StatusCode::BAD_REQUEST,
            AppError::InvalidOtp => StatusCode::BAD_REQUEST,
            AppError::OtpNotFound => StatusCode::NOT_FOUND,
            AppError::EmailNotRegistered => StatusCode::NOT_FOUND,
            AppError::InvalidResetToken => StatusCode::UNAUTHORIZED,
            AppError::MailAuth => StatusCode::UNAUTHORIZED,
            AppError::MailDelivery => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// Bad or missing JSON bodies get one generic 400 across every route.
impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        AppError::BadJson
    }
}

// Helper conversion functions
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        AppError::Provider(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
