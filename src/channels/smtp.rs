//! SMTP reply channel — outbound delivery via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{ReplyChannel, ReplyRequest};
use crate::error::NotifyError;

/// SMTP channel configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Mailbox address all outbound mail is sent from. The acting sender's
    /// name is used as the display name on this address.
    pub from_address: String,
    /// Recipient of administrative alerts.
    pub admin_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (channel disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password =
            SecretString::from(std::env::var("SMTP_PASSWORD").unwrap_or_default());
        let from_address =
            std::env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone());
        let admin_address =
            std::env::var("SMTP_ADMIN_ADDRESS").unwrap_or_else(|_| from_address.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
            admin_address,
        })
    }
}

/// SMTP reply channel.
pub struct SmtpChannel {
    config: SmtpConfig,
}

impl SmtpChannel {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );
        Ok(SmtpTransport::relay(&self.config.host)
            .map_err(|e| NotifyError::Send(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build())
    }

    fn send(&self, message: &Message) -> Result<(), NotifyError> {
        self.transport()?
            .send(message)
            .map(|_| ())
            .map_err(|e| NotifyError::Send(format!("SMTP send failed: {e}")))
    }

    /// The configured from mailbox, carrying `display_name` as the sender
    /// identity.
    fn from_mailbox(&self, display_name: &str) -> Result<Mailbox, NotifyError> {
        let address = self
            .config
            .from_address
            .parse()
            .map_err(|e| NotifyError::InvalidAddress {
                field: "from",
                reason: format!("{e}"),
            })?;
        Ok(Mailbox::new(Some(display_name.to_string()), address))
    }
}

#[async_trait]
impl ReplyChannel for SmtpChannel {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn post_reply(&self, req: &ReplyRequest<'_>) -> Result<(), NotifyError> {
        let to_address = req
            .recipient_email
            .parse()
            .map_err(|e| NotifyError::InvalidAddress {
                field: "to",
                reason: format!("{e}"),
            })?;
        let to = Mailbox::new(Some(req.recipient_name.to_string()), to_address);

        // The reply is attributed to the acting sender, not to whatever
        // account owns the SMTP session: their name fronts the from
        // mailbox and replies route back to their own address.
        let reply_to = req
            .sender
            .email
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::InvalidAddress {
                field: "reply-to",
                reason: format!("{e}"),
            })?;

        let message = Message::builder()
            .from(self.from_mailbox(&req.sender.name)?)
            .reply_to(reply_to)
            .to(to)
            .subject(req.subject.clone())
            .body(req.body.to_string())
            .map_err(|e| NotifyError::Build(format!("{e}")))?;

        self.send(&message)?;
        tracing::info!(
            to = %req.recipient_email,
            sender = %req.sender.name,
            "Reply sent"
        );
        Ok(())
    }

    async fn admin_alert(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from_mailbox("Ticket Sweeper")?)
            .to(self
                .config
                .admin_address
                .parse()
                .map_err(|e| NotifyError::InvalidAddress {
                    field: "admin",
                    reason: format!("{e}"),
                })?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(format!("{e}")))?;

        self.send(&message)?;
        tracing::info!(to = %self.config.admin_address, subject, "Admin alert sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickets::Agent;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.test.com".into(),
            port: 587,
            username: "sweeper".into(),
            password: SecretString::from("hunter2"),
            from_address: "helpdesk@test.com".into(),
            admin_address: "admin@test.com".into(),
        }
    }

    #[test]
    fn channel_name() {
        assert_eq!(SmtpChannel::new(config()).name(), "smtp");
    }

    #[test]
    fn from_mailbox_carries_sender_name() {
        let channel = SmtpChannel::new(config());
        let mailbox = channel.from_mailbox("Agent Bob").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Agent Bob"));
        assert_eq!(mailbox.email.to_string(), "helpdesk@test.com");
    }

    #[test]
    fn from_mailbox_rejects_bad_address() {
        let mut cfg = config();
        cfg.from_address = "not an address".into();
        let channel = SmtpChannel::new(cfg);
        let err = channel.from_mailbox("Agent Bob").unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress { field: "from", .. }));
    }

    #[tokio::test]
    async fn post_reply_rejects_bad_recipient() {
        let channel = SmtpChannel::new(config());
        let sender = Agent {
            id: 1,
            name: "Robot".into(),
            email: "robot@test.com".into(),
        };
        let req = ReplyRequest {
            recipient_name: "Mia",
            recipient_email: "definitely not an email",
            sender: &sender,
            subject: "Re: x".into(),
            body: "body",
            claim_ownership: false,
            alert_collaborators: false,
        };
        let err = channel.post_reply(&req).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress { field: "to", .. }));
    }

    #[test]
    fn config_from_env_returns_none_when_no_host() {
        // SAFETY: test-local env mutation; no other test reads SMTP_HOST.
        unsafe { std::env::remove_var("SMTP_HOST") };
        assert!(SmtpConfig::from_env().is_none());
    }
}
