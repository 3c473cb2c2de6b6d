//! Notification sender — composes and dispatches the automated reply.
//!
//! The acting sender is resolved explicitly (run-cached robot account, else
//! the ticket's assignee) and threaded through the channel call; the reply
//! is attributed to that identity rather than to any interactive session.
//! The recipient is always the ticket's original requester.
//!
//! Reply templates may reference `%{wholethread}`, `%{firstresponse}` and
//! `%{lastresponse}`. Only markers actually present in the template are
//! resolved; the thread is fetched at most once per ticket and unrecognized
//! markers pass through untouched.

use regex::Regex;

use crate::channels::{ReplyChannel, ReplyRequest};
use crate::error::{StoreError, SweepError};
use crate::store::Store;
use crate::sweep::AUTOMATION_POSTER;
use crate::tickets::{Agent, EntryKind, StatusDef, ThreadEntry, Ticket};

/// What happened to one ticket's notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The group configures no reply template.
    NotConfigured,
    /// Reply delivered and recorded on the thread.
    Sent,
    /// No assignee and no robot account — send skipped, note posted.
    SkippedNoSender,
    /// Delivery failed — note posted, transition proceeds regardless.
    Failed,
}

/// Template variable markers recognized in reply bodies.
const RECOGNIZED_VARS: [&str; 3] = ["wholethread", "firstresponse", "lastresponse"];

/// Send the configured auto-reply for one ticket.
///
/// Never escalates a delivery failure: the worst outcomes are
/// `SkippedNoSender` and `Failed`, both recorded as internal notes. Store
/// errors do escalate (they abort the group's batch).
pub async fn send_auto_reply(
    store: &dyn Store,
    channel: &dyn ReplyChannel,
    ticket: &Ticket,
    status: &StatusDef,
    template: &str,
    robot: Option<&Agent>,
) -> Result<NotificationOutcome, SweepError> {
    let sender = match robot {
        Some(agent) => Some(agent.clone()),
        None => match ticket.assignee_id {
            Some(id) => store.lookup_agent(id).await?,
            None => None,
        },
    };

    let Some(sender) = sender else {
        store
            .append_thread_entry(
                ticket.id,
                EntryKind::Note,
                Some("Auto-reply error"),
                "Unable to send reply: no assigned agent on ticket and no robot \
                 account configured.",
                AUTOMATION_POSTER,
            )
            .await?;
        tracing::info!(ticket_id = ticket.id, "Reply skipped: no sender identity");
        return Ok(NotificationOutcome::SkippedNoSender);
    };

    let body = render_template(store, ticket, template).await?;

    let request = ReplyRequest {
        recipient_name: &ticket.requester_name,
        recipient_email: &ticket.requester_email,
        sender: &sender,
        subject: format!("Re: {}", ticket.subject),
        body: &body,
        claim_ownership: false,
        alert_collaborators: false,
    };

    match channel.post_reply(&request).await {
        Ok(()) => {
            store
                .append_thread_entry(ticket.id, EntryKind::Response, None, &body, &sender.name)
                .await?;
            tracing::debug!(
                ticket_id = ticket.id,
                sender = %sender.name,
                status = %status.state,
                "Auto-reply sent"
            );
            Ok(NotificationOutcome::Sent)
        }
        Err(e) => {
            tracing::warn!(ticket_id = ticket.id, "Auto-reply delivery failed: {e}");
            store
                .append_thread_entry(
                    ticket.id,
                    EntryKind::Note,
                    Some("Error notification"),
                    "Unable to post a reply to the ticket requester.",
                    AUTOMATION_POSTER,
                )
                .await?;
            Ok(NotificationOutcome::Failed)
        }
    }
}

/// Substitute recognized `%{name}` markers into a reply template.
///
/// The ticket's thread is fetched at most once, and only if some recognized
/// marker is present.
pub async fn render_template(
    store: &dyn Store,
    ticket: &Ticket,
    template: &str,
) -> Result<String, StoreError> {
    let marker_re = Regex::new(r"%\{(\w+)\}").expect("static marker pattern");

    let wanted: Vec<&str> = marker_re
        .captures_iter(template)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| RECOGNIZED_VARS.contains(name))
        .collect();

    if wanted.is_empty() {
        return Ok(template.to_string());
    }

    let thread = store.list_thread(ticket.id).await?;
    let mut rendered = template.to_string();
    for name in RECOGNIZED_VARS {
        if wanted.contains(&name) {
            let value = resolve_var(name, &thread);
            rendered = rendered.replace(&format!("%{{{name}}}"), &value);
        }
    }
    Ok(rendered)
}

/// Resolve one recognized variable from the fetched thread.
fn resolve_var(name: &str, thread: &[ThreadEntry]) -> String {
    match name {
        // Everything the requester can see, oldest first.
        "wholethread" => thread
            .iter()
            .filter(|e| e.kind.requester_visible())
            .map(|e| e.body.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
        "firstresponse" => thread
            .iter()
            .find(|e| e.kind == EntryKind::Response)
            .map(|e| e.body.clone())
            .unwrap_or_default(),
        "lastresponse" => thread
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Response)
            .map(|e| e.body.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}
