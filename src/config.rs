// config.rs
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub smtp_host: String,
    pub mail_user: String,
    pub mail_pass: String,
    pub identity_base_url: String,
    pub identity_api_key: String,
    pub jwt_secret: String,
    pub otp_ttl_minutes: i64,
    pub reset_token_ttl_minutes: i64,
    pub expose_otp_in_response: bool,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            smtp_host: env::var("SMTP_HOST")
                .unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            mail_user: env::var("MAIL_USER")
                .expect("MAIL_USER must be set"),
            mail_pass: env::var("MAIL_PASS")
                .expect("MAIL_PASS must be set"),
            identity_base_url: env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".to_string()),
            identity_api_key: env::var("IDENTITY_API_KEY")
                .expect("IDENTITY_API_KEY must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            otp_ttl_minutes: env::var("OTP_TTL_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("OTP_TTL_MINUTES must be a number"),
            reset_token_ttl_minutes: env::var("RESET_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("RESET_TOKEN_TTL_MINUTES must be a number"),
            expose_otp_in_response: env::var("EXPOSE_OTP_IN_RESPONSE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }
}
