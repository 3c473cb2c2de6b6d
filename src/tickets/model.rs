//! Ticket data model — tickets, thread entries, audit events, directory types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique id. Allocation is ascending, so ascending id doubles as
    /// oldest-first ordering.
    pub id: i64,
    /// Short subject line.
    pub subject: String,
    /// Display name of the person who opened the ticket.
    pub requester_name: String,
    /// Address automated replies are delivered to.
    pub requester_email: String,
    /// Agent currently assigned, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    /// Current status (see the status directory).
    pub status_id: i64,
    /// Whether an agent has answered the requester.
    pub is_answered: bool,
    /// Whether the ticket is past its due date.
    pub is_overdue: bool,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    /// Set when the ticket reaches a closed state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Last time anything touched the ticket.
    pub last_update: DateTime<Utc>,
    /// When the ticket was opened.
    pub created_at: DateTime<Utc>,
    /// Count of sub-tasks still open under this ticket.
    pub open_subtasks: i64,
    /// Whether a required form field is still blank.
    pub missing_required_fields: bool,
}

impl Ticket {
    /// Create a ticket with defaults. The id is assigned at insert.
    pub fn new(
        subject: impl Into<String>,
        requester_name: impl Into<String>,
        requester_email: impl Into<String>,
        status_id: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            subject: subject.into(),
            requester_name: requester_name.into(),
            requester_email: requester_email.into(),
            assignee_id: None,
            status_id,
            is_answered: false,
            is_overdue: false,
            due_at: None,
            closed_at: None,
            last_update: now,
            created_at: now,
            open_subtasks: 0,
            missing_required_fields: false,
        }
    }

    /// Builder: set the assignee.
    pub fn with_assignee(mut self, agent_id: i64) -> Self {
        self.assignee_id = Some(agent_id);
        self
    }

    /// Builder: set the last-update timestamp.
    pub fn with_last_update(mut self, at: DateTime<Utc>) -> Self {
        self.last_update = at;
        self
    }

    /// Builder: mark answered.
    pub fn answered(mut self) -> Self {
        self.is_answered = true;
        self
    }

    /// Builder: set a due date and the overdue flag.
    pub fn overdue_since(mut self, due: DateTime<Utc>) -> Self {
        self.due_at = Some(due);
        self.is_overdue = true;
        self
    }

    /// Builder: leave open sub-tasks hanging off the ticket.
    pub fn with_open_subtasks(mut self, count: i64) -> Self {
        self.open_subtasks = count;
        self
    }

    /// Whether a status change is currently permitted.
    ///
    /// Derived at transition time, not stored: open sub-tasks or a missing
    /// required field block the change even for an otherwise-stale ticket.
    pub fn is_closeable(&self) -> bool {
        self.open_subtasks == 0 && !self.missing_required_fields
    }
}

/// Kind of a thread entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Inbound message from the requester. Visible to the requester.
    Message,
    /// Agent answer to the requester. Visible to the requester.
    Response,
    /// Internal staff note. Never shown to the requester.
    Note,
}

impl EntryKind {
    /// The string tag stored in the DB kind column.
    pub fn type_tag(&self) -> &'static str {
        match self {
            EntryKind::Message => "message",
            EntryKind::Response => "response",
            EntryKind::Note => "note",
        }
    }

    /// Parse a kind from its DB representation.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "message" => Some(EntryKind::Message),
            "response" => Some(EntryKind::Response),
            "note" => Some(EntryKind::Note),
            _ => None,
        }
    }

    /// Whether the requester can see entries of this kind.
    pub fn requester_visible(&self) -> bool {
        !matches!(self, EntryKind::Note)
    }
}

/// One entry on a ticket's thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub id: i64,
    pub ticket_id: i64,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    /// Display name of whoever posted the entry.
    pub poster: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit event on a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    pub id: i64,
    pub ticket_id: i64,
    /// The new status's state tag, e.g. `"closed"`.
    pub event_type: String,
    /// Structured event data; status changes carry the new status id + name.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A status definition from the status directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDef {
    pub id: i64,
    /// Display name, e.g. `"Closed — inactive"`.
    pub name: String,
    /// Machine state tag, e.g. `"closed"`.
    pub state: String,
}

/// A canned response from the canned-response directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// An agent identity from the identity directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ticket_defaults() {
        let ticket = Ticket::new("Printer on fire", "Sam", "sam@example.com", 2);
        assert_eq!(ticket.id, 0);
        assert_eq!(ticket.status_id, 2);
        assert!(ticket.assignee_id.is_none());
        assert!(!ticket.is_answered);
        assert!(!ticket.is_overdue);
        assert!(ticket.due_at.is_none());
        assert!(ticket.closed_at.is_none());
    }

    #[test]
    fn closeable_by_default() {
        let ticket = Ticket::new("T", "R", "r@example.com", 2);
        assert!(ticket.is_closeable());
    }

    #[test]
    fn open_subtasks_block_closing() {
        let ticket = Ticket::new("T", "R", "r@example.com", 2).with_open_subtasks(2);
        assert!(!ticket.is_closeable());
    }

    #[test]
    fn missing_fields_block_closing() {
        let mut ticket = Ticket::new("T", "R", "r@example.com", 2);
        ticket.missing_required_fields = true;
        assert!(!ticket.is_closeable());
    }

    #[test]
    fn overdue_builder_sets_flag_and_due() {
        let due = Utc::now();
        let ticket = Ticket::new("T", "R", "r@example.com", 2).overdue_since(due);
        assert!(ticket.is_overdue);
        assert_eq!(ticket.due_at, Some(due));
    }

    #[test]
    fn entry_kind_tag_roundtrip() {
        for kind in [EntryKind::Message, EntryKind::Response, EntryKind::Note] {
            assert_eq!(EntryKind::from_tag(kind.type_tag()), Some(kind));
        }
        assert_eq!(EntryKind::from_tag("bogus"), None);
    }

    #[test]
    fn notes_are_not_requester_visible() {
        assert!(EntryKind::Message.requester_visible());
        assert!(EntryKind::Response.requester_visible());
        assert!(!EntryKind::Note.requester_visible());
    }

    #[test]
    fn ticket_serde_roundtrip() {
        let ticket = Ticket::new("Help", "Ana", "ana@example.com", 2)
            .with_assignee(9)
            .answered();
        let json = serde_json::to_string(&ticket).unwrap();
        let parsed: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.subject, "Help");
        assert_eq!(parsed.assignee_id, Some(9));
        assert!(parsed.is_answered);
    }

    #[test]
    fn ticket_optional_fields_omitted() {
        let ticket = Ticket::new("T", "R", "r@example.com", 2);
        let json = serde_json::to_string(&ticket).unwrap();
        assert!(!json.contains("\"assignee_id\""));
        assert!(!json.contains("\"due_at\""));
        assert!(!json.contains("\"closed_at\""));
    }
}
