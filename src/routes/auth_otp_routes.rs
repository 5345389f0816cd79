use axum::{
    routing::post,
    Router,
};

use crate::{
    handlers::auth_otp,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        // Request OTP for signup verification or password reset
        .route("/send-otp", post(auth_otp::send_otp))

        // Verify OTP
        .route("/verify-otp", post(auth_otp::verify_otp))

        // Reset password with the token from a verified OTP
        .route("/reset-password", post(auth_otp::reset_password))
}
