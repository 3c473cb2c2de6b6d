//! Transition executor — validates, annotates, notifies, and transitions
//! each of a group's candidates.
//!
//! Failures are isolated per ticket: a candidate that no longer resolves or
//! fails the closeability gate is recorded and skipped, and the loop moves
//! on. Store errors abort the group's batch and surface to the sweeper,
//! which logs them and proceeds to the next group.

use chrono::{DateTime, Utc};

use crate::channels::ReplyChannel;
use crate::config::PolicyGroup;
use crate::error::{StoreError, SweepError};
use crate::store::Store;
use crate::sweep::notify::{self, NotificationOutcome};
use crate::sweep::{AUTOMATION_POSTER, finder};
use crate::tickets::{Agent, EntryKind, StatusDef, Ticket};

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketOutcome {
    /// Status changed; carries the notification outcome.
    Transitioned { notification: NotificationOutcome },
    /// Closeability gate rejected the ticket; annotated and left as-is.
    /// Eligible again on the next invocation if still matching.
    NotCloseable,
    /// Candidate id no longer resolves to a ticket.
    Missing,
}

/// Aggregated result of one group's batch.
#[derive(Debug)]
pub struct GroupReport {
    pub group_id: u32,
    /// Candidates returned by the eligibility query.
    pub matched: usize,
    /// Candidates whose status actually changed.
    pub transitioned: usize,
    pub outcomes: Vec<(i64, TicketOutcome)>,
}

impl GroupReport {
    fn empty(group_id: u32) -> Self {
        Self {
            group_id,
            matched: 0,
            transitioned: 0,
            outcomes: Vec::new(),
        }
    }
}

/// Run one enabled policy group's batch.
pub async fn run_group(
    store: &dyn Store,
    channel: &dyn ReplyChannel,
    group: &PolicyGroup,
    robot: Option<&Agent>,
    now: DateTime<Utc>,
) -> Result<GroupReport, SweepError> {
    let candidates = finder::find_candidates(store, group, now).await?;
    tracing::debug!(group = group.id, count = candidates.len(), "Group candidates");

    // Bail before gathering resources if there's no work to do.
    if candidates.is_empty() {
        return Ok(GroupReport::empty(group.id));
    }

    let status = store
        .lookup_status(group.to_status)
        .await?
        .ok_or(SweepError::UnknownStatus { id: group.to_status })?;

    let reply_template = match group.reply_canned_id {
        Some(id) => Some(
            store
                .lookup_canned(id)
                .await?
                .ok_or(SweepError::UnknownCanned { id })?
                .body,
        ),
        None => None,
    };

    let mut report = GroupReport::empty(group.id);
    report.matched = candidates.len();

    for ticket_id in candidates {
        let outcome = process_candidate(
            store,
            channel,
            group,
            &status,
            reply_template.as_deref(),
            robot,
            ticket_id,
            now,
        )
        .await?;

        if matches!(outcome, TicketOutcome::Transitioned { .. }) {
            report.transitioned += 1;
        }
        report.outcomes.push((ticket_id, outcome));
    }

    Ok(report)
}

/// Process a single candidate: resolve → closeability gate → note →
/// notification → transition.
#[allow(clippy::too_many_arguments)]
async fn process_candidate(
    store: &dyn Store,
    channel: &dyn ReplyChannel,
    group: &PolicyGroup,
    status: &StatusDef,
    reply_template: Option<&str>,
    robot: Option<&Agent>,
    ticket_id: i64,
    now: DateTime<Utc>,
) -> Result<TicketOutcome, SweepError> {
    let Some(mut ticket) = store.get_ticket(ticket_id).await? else {
        tracing::error!(ticket_id, "Candidate no longer resolves to a ticket");
        return Ok(TicketOutcome::Missing);
    };

    // Some tickets aren't closeable, either because of open sub-tasks or
    // missing required fields. Annotate and leave them for the next run.
    if !ticket.is_closeable() {
        store
            .append_thread_entry(
                ticket.id,
                EntryKind::Note,
                Some("Error auto-changing status"),
                &format!("Unable to change this ticket's status to {}", status.state),
                AUTOMATION_POSTER,
            )
            .await?;
        tracing::info!(ticket_id, "Ticket not closeable, skipped");
        return Ok(TicketOutcome::NotCloseable);
    }

    // Internal note, posted by the automation actor with no outward alert.
    if let Some(note) = &group.note_text {
        store
            .append_thread_entry(
                ticket.id,
                EntryKind::Note,
                Some(&format!("Changing status to: {}", status.state)),
                note,
                AUTOMATION_POSTER,
            )
            .await?;
    }

    // Reply before the status change so a delivery failure can't block the
    // transition and any failure note lands before the status event.
    let notification = match reply_template {
        Some(template) => {
            notify::send_auto_reply(store, channel, &ticket, status, template, robot).await?
        }
        None => NotificationOutcome::NotConfigured,
    };

    transition(store, &mut ticket, status, now).await?;
    Ok(TicketOutcome::Transitioned { notification })
}

/// Apply the status change and persist it in one write.
async fn transition(
    store: &dyn Store,
    ticket: &mut Ticket,
    status: &StatusDef,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    tracing::debug!(
        ticket_id = ticket.id,
        subject = %ticket.subject,
        status = %status.state,
        "Setting status"
    );

    // Closed and last-update stamps first, then drop any due date and the
    // overdue flag. No intermediate save — one consolidated write below.
    ticket.closed_at = Some(now);
    ticket.last_update = now;
    ticket.due_at = None;
    ticket.is_overdue = false;

    store
        .append_event(
            ticket.id,
            &status.state,
            &serde_json::json!({ "status": [status.id, status.name] }),
        )
        .await?;

    ticket.status_id = status.id;

    // Refetch suppressed: nothing reads the row again this run.
    store.save_ticket(ticket, false).await?;
    Ok(())
}
