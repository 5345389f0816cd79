use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::otp::{OtpPurpose, OtpRecord};
use crate::services::identity_service::IdentityProvider;
use crate::services::mail_service::{MailError, MailSender};
use crate::services::otp_store::OtpStore;

const RESET_PURPOSE: &str = "password_reset";

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: String,
    purpose: String,
    jti: String,
    exp: usize,
}

#[derive(Clone)]
pub struct OtpSettings {
    pub jwt_secret: String,
    pub otp_ttl: Duration,
    pub reset_token_ttl: Duration,
}

#[derive(Clone)]
pub struct OtpService {
    store: OtpStore,
    identity: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn MailSender>,
    settings: OtpSettings,
}

impl OtpService {
    pub fn new(
        store: OtpStore,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn MailSender>,
        settings: OtpSettings,
    ) -> Self {
        Self {
            store,
            identity,
            mailer,
            settings,
        }
    }

    // Generate 6-digit OTP
    pub fn generate_otp() -> String {
        let mut rng = rand::thread_rng();
        rng.gen_range(100_000..1_000_000).to_string()
    }

    /// Generate a code for `email`, store it (replacing any pending one),
    /// and mail it out. Reset requests must name a registered identity;
    /// signup requests skip the check because the account may not exist yet.
    pub async fn issue_code(&self, email: &str, purpose: OtpPurpose) -> Result<String> {
        if purpose == OtpPurpose::Reset {
            let user = self.identity.find_user_by_email(email).await.map_err(|e| {
                error!("Identity check failed for {}: {}", email, e);
                AppError::provider("Server error during user check.")
            })?;

            if user.is_none() {
                info!("Reset code refused, address not registered: {}", email);
                return Err(AppError::EmailNotRegistered);
            }
        }

        let code = Self::generate_otp();
        self.store.put_code(
            email,
            OtpRecord::new(code.clone(), purpose, self.settings.otp_ttl),
        );

        let body = format!("Your OTP code is: {}", code);
        self.mailer
            .send(email, purpose.mail_subject(), &body)
            .await
            .map_err(|e| match e {
                MailError::Auth(_) => AppError::MailAuth,
                MailError::Delivery(_) | MailError::BadAddress(_) => AppError::MailDelivery,
            })?;

        info!("OTP sent successfully to {} for {:?}", email, purpose);
        Ok(code)
    }

    /// Check a submitted code against the stored one. A match consumes the
    /// record and mints a single-use reset token; a mismatch leaves the
    /// record in place so the caller can retry.
    pub fn verify_code(&self, email: &str, code: &str) -> Result<String> {
        let record = self.store.get_code(email).ok_or(AppError::OtpNotFound)?;

        if record.code != code {
            return Err(AppError::InvalidOtp);
        }

        self.store.remove_code(email);
        let token = self.generate_reset_token(email)?;

        info!("OTP verified successfully for {}", email);
        Ok(token)
    }

    /// Replace the identity's password. Requires the reset token minted by
    /// a prior successful verification; the token's session is consumed
    /// here, so a token works exactly once.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        reset_token: &str,
    ) -> Result<()> {
        let claims = self.decode_reset_token(reset_token)?;
        if claims.sub != email || claims.purpose != RESET_PURPOSE {
            return Err(AppError::InvalidResetToken);
        }
        match self.store.take_reset_session(email) {
            Some(jti) if jti == claims.jti => {}
            _ => return Err(AppError::InvalidResetToken),
        }

        let user = self
            .identity
            .find_user_by_email(email)
            .await
            .map_err(|e| {
                error!("Identity lookup failed for {}: {}", email, e);
                AppError::provider("Failed to update password.")
            })?
            .ok_or_else(|| {
                error!("Password reset requested for unknown identity: {}", email);
                AppError::provider("Failed to update password.")
            })?;

        self.identity
            .update_password(&user.uid, new_password)
            .await
            .map_err(|e| {
                error!("Password update failed for {}: {}", email, e);
                AppError::provider("Failed to update password.")
            })?;

        info!("Password updated successfully for user: {}", email);
        Ok(())
    }

    fn generate_reset_token(&self, email: &str) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(self.settings.reset_token_ttl)
            .ok_or_else(|| AppError::provider("Failed to calculate expiration"))?
            .timestamp() as usize;

        let jti = Uuid::new_v4().to_string();
        let claims = ResetClaims {
            sub: email.to_string(),
            purpose: RESET_PURPOSE.to_string(),
            jti: jti.clone(),
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::provider(format!("Token generation failed: {}", e)))?;

        self.store.put_reset_session(email, jti);
        Ok(token)
    }

    fn decode_reset_token(&self, token: &str) -> Result<ResetClaims> {
        decode::<ResetClaims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidResetToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_mocks::{MailFailure, MockIdentityProvider, MockMailer};
    use std::sync::atomic::Ordering;

    fn settings() -> OtpSettings {
        OtpSettings {
            jwt_secret: "test-secret".into(),
            otp_ttl: Duration::minutes(5),
            reset_token_ttl: Duration::minutes(10),
        }
    }

    fn service(
        identity: MockIdentityProvider,
        mailer: MockMailer,
    ) -> (
        OtpService,
        OtpStore,
        Arc<MockIdentityProvider>,
        Arc<MockMailer>,
    ) {
        let store = OtpStore::new();
        let identity = Arc::new(identity);
        let mailer = Arc::new(mailer);
        let svc = OtpService::new(
            store.clone(),
            identity.clone() as Arc<dyn IdentityProvider>,
            mailer.clone() as Arc<dyn MailSender>,
            settings(),
        );
        (svc, store, identity, mailer)
    }

    #[test]
    fn generated_codes_are_six_digits_in_range() {
        for _ in 0..100 {
            let code = OtpService::generate_otp();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[tokio::test]
    async fn signup_issuance_skips_registration_check() {
        let (svc, store, identity, mailer) =
            service(MockIdentityProvider::default(), MockMailer::default());

        let code = svc.issue_code("new@x.com", OtpPurpose::Signup).await.unwrap();

        assert_eq!(identity.lookup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(store.get_code("new@x.com").unwrap().code, code);
    }

    #[tokio::test]
    async fn reset_issuance_for_unknown_address_stores_nothing_and_sends_nothing() {
        let (svc, store, _, mailer) =
            service(MockIdentityProvider::default(), MockMailer::default());

        let err = svc
            .issue_code("unknown@x.com", OtpPurpose::Reset)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmailNotRegistered));
        assert!(store.get_code("unknown@x.com").is_none());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn reset_issuance_for_registered_address_goes_through() {
        let (svc, _, identity, mailer) = service(
            MockIdentityProvider::with_user("known@x.com"),
            MockMailer::default(),
        );

        svc.issue_code("known@x.com", OtpPurpose::Reset).await.unwrap();

        assert_eq!(identity.lookup_calls.load(Ordering::SeqCst), 1);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].0, "known@x.com");
        assert_eq!(sent[0].1, "Your Password Reset Code");
    }

    #[tokio::test]
    async fn provider_outage_during_reset_issuance_is_a_provider_error() {
        let identity = MockIdentityProvider {
            fail_lookup: true,
            ..Default::default()
        };
        let (svc, store, _, _) = service(identity, MockMailer::default());

        let err = svc
            .issue_code("a@x.com", OtpPurpose::Reset)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Provider(_)));
        assert!(store.get_code("a@x.com").is_none());
    }

    #[tokio::test]
    async fn mail_auth_failure_maps_to_auth_error_and_keeps_the_code() {
        let (svc, store, _, _) = service(
            MockIdentityProvider::default(),
            MockMailer::failing(MailFailure::Auth),
        );

        let err = svc
            .issue_code("a@x.com", OtpPurpose::Signup)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MailAuth));
        // stored before the send, as in the original flow
        assert!(store.get_code("a@x.com").is_some());
    }

    #[tokio::test]
    async fn mail_transport_failure_maps_to_delivery_error() {
        let (svc, _, _, _) = service(
            MockIdentityProvider::default(),
            MockMailer::failing(MailFailure::Delivery),
        );

        let err = svc
            .issue_code("a@x.com", OtpPurpose::Signup)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MailDelivery));
    }

    #[tokio::test]
    async fn reissuing_overwrites_so_only_the_newest_code_verifies() {
        let (svc, _, _, mailer) =
            service(MockIdentityProvider::default(), MockMailer::default());

        let first = svc.issue_code("a@x.com", OtpPurpose::Signup).await.unwrap();
        let second = svc.issue_code("a@x.com", OtpPurpose::Signup).await.unwrap();
        assert_eq!(mailer.sent_count(), 2);

        if first != second {
            let err = svc.verify_code("a@x.com", &first).unwrap_err();
            assert!(matches!(err, AppError::InvalidOtp));
        }
        assert!(svc.verify_code("a@x.com", &second).is_ok());
    }

    #[tokio::test]
    async fn correct_code_is_single_use() {
        let (svc, _, _, _) =
            service(MockIdentityProvider::default(), MockMailer::default());

        let code = svc.issue_code("a@x.com", OtpPurpose::Signup).await.unwrap();

        assert!(svc.verify_code("a@x.com", &code).is_ok());
        let err = svc.verify_code("a@x.com", &code).unwrap_err();
        assert!(matches!(err, AppError::OtpNotFound));
    }

    #[tokio::test]
    async fn wrong_code_leaves_the_record_usable() {
        let (svc, _, _, _) =
            service(MockIdentityProvider::default(), MockMailer::default());

        let code = svc.issue_code("a@x.com", OtpPurpose::Signup).await.unwrap();
        let wrong = if code == "123456" { "654321" } else { "123456" };

        let err = svc.verify_code("a@x.com", wrong).unwrap_err();
        assert!(matches!(err, AppError::InvalidOtp));
        assert!(svc.verify_code("a@x.com", &code).is_ok());
    }

    #[test]
    fn verifying_with_no_outstanding_code_is_not_found() {
        let (svc, _, _, _) =
            service(MockIdentityProvider::default(), MockMailer::default());

        let err = svc.verify_code("nobody@x.com", "123456").unwrap_err();
        assert!(matches!(err, AppError::OtpNotFound));
    }

    #[test]
    fn expired_code_reads_as_not_found() {
        let (svc, store, _, _) =
            service(MockIdentityProvider::default(), MockMailer::default());

        store.put_code(
            "a@x.com",
            OtpRecord::new("123456".into(), OtpPurpose::Signup, Duration::minutes(-1)),
        );

        let err = svc.verify_code("a@x.com", "123456").unwrap_err();
        assert!(matches!(err, AppError::OtpNotFound));
    }

    #[tokio::test]
    async fn reset_with_verified_token_updates_password_once() {
        let (svc, _, identity, _) = service(
            MockIdentityProvider::with_user("a@x.com"),
            MockMailer::default(),
        );

        let code = svc.issue_code("a@x.com", OtpPurpose::Reset).await.unwrap();
        let token = svc.verify_code("a@x.com", &code).unwrap();

        svc.reset_password("a@x.com", "hunter42", &token).await.unwrap();

        let updates = identity.password_updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, "hunter42");

        // token session was consumed; replay is rejected
        let err = svc
            .reset_password("a@x.com", "hunter43", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidResetToken));
    }

    #[tokio::test]
    async fn reset_rejects_garbage_and_cross_address_tokens() {
        let (svc, _, _, _) = service(
            MockIdentityProvider::with_user("a@x.com"),
            MockMailer::default(),
        );

        let err = svc
            .reset_password("a@x.com", "hunter42", "not-a-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidResetToken));

        // token minted for one address must not reset another
        let code = svc.issue_code("a@x.com", OtpPurpose::Reset).await.unwrap();
        let token = svc.verify_code("a@x.com", &code).unwrap();
        let err = svc
            .reset_password("b@x.com", "hunter42", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidResetToken));
    }

    #[tokio::test]
    async fn reset_surfaces_provider_failures_generically() {
        let identity = MockIdentityProvider {
            fail_update: true,
            ..Default::default()
        };
        identity.add_user("a@x.com");
        let (svc, _, _, _) = service(identity, MockMailer::default());

        let code = svc.issue_code("a@x.com", OtpPurpose::Reset).await.unwrap();
        let token = svc.verify_code("a@x.com", &code).unwrap();

        let err = svc
            .reset_password("a@x.com", "hunter42", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }
}
