//! Outbound notification channels.
//!
//! The sweeper talks to a `ReplyChannel`: post an automated reply to a
//! ticket's requester under an explicit acting sender, or raise an
//! administrative alert. `SmtpChannel` delivers over SMTP; `LogChannel` is
//! the fallback when SMTP is not configured.

pub mod smtp;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::tickets::Agent;

pub use smtp::{SmtpChannel, SmtpConfig};

/// One outbound auto-reply.
#[derive(Debug)]
pub struct ReplyRequest<'a> {
    /// Display name of the recipient (the ticket's requester).
    pub recipient_name: &'a str,
    /// Delivery address of the recipient.
    pub recipient_email: &'a str,
    /// The acting sender the reply is attributed to.
    pub sender: &'a Agent,
    /// Subject line.
    pub subject: String,
    /// Fully rendered body.
    pub body: &'a str,
    /// Whether the sender claims ownership of the ticket. Always false for
    /// automated replies.
    pub claim_ownership: bool,
    /// Whether collaborators are alerted. Always false — only the original
    /// requester is notified.
    pub alert_collaborators: bool,
}

/// Channel for outbound replies and administrative alerts.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Deliver a reply to the requester, attributed to `req.sender`.
    async fn post_reply(&self, req: &ReplyRequest<'_>) -> Result<(), NotifyError>;

    /// Deliver a one-off administrative alert.
    async fn admin_alert(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Fallback channel: logs outbound traffic instead of delivering it.
///
/// Used when no SMTP settings are present so the sweeper can still run
/// (transitions proceed; "deliveries" are visible in the log).
pub struct LogChannel;

#[async_trait]
impl ReplyChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn post_reply(&self, req: &ReplyRequest<'_>) -> Result<(), NotifyError> {
        tracing::info!(
            to = %req.recipient_email,
            from = %req.sender.name,
            subject = %req.subject,
            "Reply not delivered (no SMTP configured), logging only"
        );
        Ok(())
    }

    async fn admin_alert(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::warn!(subject, body, "Admin alert (no SMTP configured)");
        Ok(())
    }
}
