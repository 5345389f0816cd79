use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::identity_service::IdentityProvider;
use crate::services::mail_service::MailSender;
use crate::services::otp_service::{OtpService, OtpSettings};
use crate::services::otp_store::OtpStore;

#[derive(Clone)]
pub struct AppState {
    pub otp_service: OtpService,
    pub expose_otp_in_response: bool,
}

impl AppState {
    pub fn new(
        store: OtpStore,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn MailSender>,
        config: &AppConfig,
    ) -> Self {
        let settings = OtpSettings {
            jwt_secret: config.jwt_secret.clone(),
            otp_ttl: chrono::Duration::minutes(config.otp_ttl_minutes),
            reset_token_ttl: chrono::Duration::minutes(config.reset_token_ttl_minutes),
        };

        AppState {
            otp_service: OtpService::new(store, identity, mailer, settings),
            expose_otp_in_response: config.expose_otp_in_response,
        }
    }
}
