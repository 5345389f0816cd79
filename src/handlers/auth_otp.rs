use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use crate::dtos::auth_dtos::{
    ResetPasswordRequest, ResetPasswordResponse, SendOtpRequest, SendOtpResponse,
    VerifyOtpRequest, VerifyOtpResponse,
};
use crate::errors::{AppError, Result};
use crate::models::otp::OtpPurpose;
use crate::state::AppState;

// The original clients send empty strings as readily as they omit fields;
// both count as missing.
fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(message)),
    }
}

fn validated<T: Validate>(req: &T) -> Result<()> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Validation error: {}", e)))
}

// 1. Request OTP
pub async fn send_otp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<SendOtpResponse>> {
    let Json(req) = payload?;

    let email = required(req.email.as_deref(), "Email is required.")?;
    validated(&req)?;

    let purpose = req.purpose.unwrap_or(OtpPurpose::Signup);
    let code = state.otp_service.issue_code(email, purpose).await?;

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent".to_string(),
        otp: state.expose_otp_in_response.then_some(code),
    }))
}

// 2. Verify OTP
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>> {
    let Json(req) = payload?;

    let (email, otp) = match (req.email.as_deref(), req.otp.as_deref()) {
        (Some(e), Some(o)) if !e.trim().is_empty() && !o.trim().is_empty() => {
            (e.trim(), o.trim())
        }
        _ => return Err(AppError::validation("Email and OTP are required.")),
    };
    validated(&req)?;

    let reset_token = state.otp_service.verify_code(email, otp)?;

    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "OTP verified successfully.".to_string(),
        reset_token,
    }))
}

// 3. Reset password (requires the token from a successful verification)
pub async fn reset_password(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<ResetPasswordResponse>> {
    let Json(req) = payload?;

    let (email, new_password) = match (req.email.as_deref(), req.new_password.as_deref()) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e.trim(), p),
        _ => return Err(AppError::validation("Missing email or newPassword.")),
    };
    let reset_token = req
        .reset_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(AppError::InvalidResetToken)?;
    validated(&req)?;

    state
        .otp_service
        .reset_password(email, new_password, reset_token)
        .await?;

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password updated successfully.".to_string(),
    }))
}
