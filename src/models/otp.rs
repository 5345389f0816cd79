use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Why the caller wants a code. Reset requires the address to already be
/// registered with the identity provider; signup must not check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Signup,
    Reset,
}

impl OtpPurpose {
    pub fn mail_subject(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "Your Account Verification Code",
            OtpPurpose::Reset => "Your Password Reset Code",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub code: String,        // 6-digit OTP
    pub purpose: OtpPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn new(code: String, purpose: OtpPurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            code,
            purpose,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
