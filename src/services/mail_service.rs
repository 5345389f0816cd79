// services/mail_service.rs
use async_trait::async_trait;
use lettre::{
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::error;

use crate::config::AppConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("SMTP authentication rejected: {0}")]
    Auth(String),

    #[error("mail delivery failed: {0}")]
    Delivery(String),

    #[error("bad mail address: {0}")]
    BadAddress(String),
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// SMTP over implicit TLS (Gmail-style, port 465), credentials from config.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| MailError::Delivery(format!("SMTP relay setup failed: {}", e)))?
            .credentials(Credentials::new(
                config.mail_user.clone(),
                config.mail_pass.clone(),
            ))
            .build();

        let from = config
            .mail_user
            .parse::<Mailbox>()
            .map_err(|e| MailError::BadAddress(format!("MAIL_USER: {}", e)))?;

        Ok(SmtpMailer { transport, from })
    }

    fn classify(err: lettre::transport::smtp::Error) -> MailError {
        // 535 is the server telling us our credentials were rejected
        // (wrong app password, 2FA not set up). Everything else is a
        // generic delivery failure.
        let message = err.to_string();
        if err.is_permanent() && message.contains("535") {
            MailError::Auth(message)
        } else {
            MailError::Delivery(message)
        }
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| MailError::BadAddress(format!("{}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| MailError::Delivery(format!("message build failed: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("SMTP send to {} failed: {}", to, e);
                Err(Self::classify(e))
            }
        }
    }
}
