//! Hand-rolled collaborator doubles for service and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::services::identity_service::{IdentityError, IdentityProvider, IdentityUser};
use crate::services::mail_service::{MailError, MailSender};

#[derive(Default)]
pub struct MockIdentityProvider {
    pub users: Mutex<Vec<IdentityUser>>,
    pub fail_lookup: bool,
    pub fail_update: bool,
    pub lookup_calls: AtomicUsize,
    pub password_updates: Mutex<Vec<(String, String)>>,
}

impl MockIdentityProvider {
    pub fn with_user(email: &str) -> Self {
        let provider = Self::default();
        provider.add_user(email);
        provider
    }

    pub fn add_user(&self, email: &str) {
        self.users.lock().unwrap().push(IdentityUser {
            uid: format!("uid-{}", email),
            email: email.to_string(),
        });
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, IdentityError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(IdentityError("lookup backend down".into()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError> {
        if self.fail_update {
            return Err(IdentityError("update backend down".into()));
        }
        self.password_updates
            .lock()
            .unwrap()
            .push((uid.to_string(), new_password.to_string()));
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub enum MailFailure {
    Auth,
    Delivery,
}

/// Records (to, subject, body) triples instead of talking SMTP.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
    pub failure: Option<MailFailure>,
}

impl MockMailer {
    pub fn failing(failure: MailFailure) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(failure),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailSender for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if let Some(failure) = self.failure {
            return Err(match failure {
                MailFailure::Auth => MailError::Auth("535 5.7.8 credentials rejected".into()),
                MailFailure::Delivery => MailError::Delivery("connection reset".into()),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}
