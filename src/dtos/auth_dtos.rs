use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::otp::OtpPurpose;

// Request DTOs. Required fields are Option so that an absent field surfaces
// as a 400 with the documented message instead of a serde rejection.

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email address format."))]
    pub email: Option<String>,

    #[serde(rename = "type")]
    pub purpose: Option<OtpPurpose>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,

    #[validate(length(min = 6, max = 6, message = "OTP must be 6 digits"))]
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,

    #[serde(rename = "newPassword")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,

    #[serde(rename = "resetToken")]
    pub reset_token: Option<String>,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,

    // Echoed only when EXPOSE_OTP_IN_RESPONSE is on (demo convenience).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,

    #[serde(rename = "resetToken")]
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub message: String,
}
