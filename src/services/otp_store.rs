use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::models::otp::OtpRecord;

/// Process-local store for outstanding codes and reset sessions.
///
/// One live code per email address: `put_code` overwrites unconditionally,
/// so a re-request invalidates whatever was pending. Expired records are
/// purged lazily the first time they are read. Everything here is volatile;
/// a restart forgets all outstanding codes, which callers see as a 404.
#[derive(Clone, Default)]
pub struct OtpStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    codes: HashMap<String, OtpRecord>,
    // email -> jti of the one reset token minted for it
    reset_sessions: HashMap<String, String>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_code(&self, email: &str, record: OtpRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.codes.insert(email.to_string(), record);
    }

    /// Fetch the live record for an address, dropping it if it has expired.
    pub fn get_code(&self, email: &str) -> Option<OtpRecord> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        let expired = inner.codes.get(email).map(|r| r.is_expired(now));
        match expired {
            Some(true) => {
                inner.codes.remove(email);
                None
            }
            Some(false) => inner.codes.get(email).cloned(),
            None => None,
        }
    }

    pub fn remove_code(&self, email: &str) -> Option<OtpRecord> {
        let mut inner = self.inner.lock().unwrap();
        inner.codes.remove(email)
    }

    pub fn put_reset_session(&self, email: &str, jti: String) {
        let mut inner = self.inner.lock().unwrap();
        inner.reset_sessions.insert(email.to_string(), jti);
    }

    /// Consume the reset session for an address. Single use.
    pub fn take_reset_session(&self, email: &str) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.reset_sessions.remove(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::otp::OtpPurpose;
    use chrono::Duration;

    fn record(code: &str, ttl_minutes: i64) -> OtpRecord {
        OtpRecord::new(code.into(), OtpPurpose::Signup, Duration::minutes(ttl_minutes))
    }

    #[test]
    fn put_overwrites_previous_code() {
        let store = OtpStore::new();
        store.put_code("a@x.com", record("111111", 5));
        store.put_code("a@x.com", record("222222", 5));

        let live = store.get_code("a@x.com").unwrap();
        assert_eq!(live.code, "222222");
    }

    #[test]
    fn expired_record_is_purged_on_read() {
        let store = OtpStore::new();
        store.put_code("a@x.com", record("111111", -1));

        assert!(store.get_code("a@x.com").is_none());
        // gone for good, not just hidden
        assert!(store.remove_code("a@x.com").is_none());
    }

    #[test]
    fn remove_consumes_the_record() {
        let store = OtpStore::new();
        store.put_code("a@x.com", record("111111", 5));

        assert!(store.remove_code("a@x.com").is_some());
        assert!(store.get_code("a@x.com").is_none());
    }

    #[test]
    fn addresses_are_independent() {
        let store = OtpStore::new();
        store.put_code("a@x.com", record("111111", 5));
        store.put_code("b@x.com", record("222222", 5));

        store.remove_code("a@x.com");
        assert_eq!(store.get_code("b@x.com").unwrap().code, "222222");
    }

    #[test]
    fn reset_session_is_single_use() {
        let store = OtpStore::new();
        store.put_reset_session("a@x.com", "jti-1".into());

        assert_eq!(store.take_reset_session("a@x.com").as_deref(), Some("jti-1"));
        assert!(store.take_reset_session("a@x.com").is_none());
    }
}
