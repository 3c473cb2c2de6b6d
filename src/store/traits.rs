//! Unified `Store` trait — single async interface for all persistence.
//!
//! Covers the ticket store, the thread/audit sinks, the three lookup
//! directories (statuses, canned responses, agents), and the persisted
//! sweep-schedule marker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::tickets::{Agent, CannedResponse, StatusDef, ThreadEntry, Ticket, TicketEvent};

/// Filter parameters for the stale-ticket query.
///
/// The caller (the eligibility finder) validates these before the query is
/// issued; the store applies them verbatim.
#[derive(Debug, Clone)]
pub struct StaleQuery {
    /// Select tickets currently in this status.
    pub from_status: i64,
    /// Select tickets whose last update is strictly before this instant.
    pub cutoff: DateTime<Utc>,
    /// Only tickets with an agent answer.
    pub only_answered: bool,
    /// Only tickets flagged overdue.
    pub only_overdue: bool,
    /// Result bound.
    pub max: u32,
}

/// Backend-agnostic store covering tickets, threads, events, directories,
/// and schedule state.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Schedule state ──────────────────────────────────────────────

    /// Read the persisted last-sweep marker, if one has ever been written.
    async fn last_sweep_at(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Overwrite the last-sweep marker.
    async fn record_sweep_at(&self, at: DateTime<Utc>) -> Result<(), StoreError>;

    // ── Tickets ─────────────────────────────────────────────────────

    /// Ids of tickets matching the stale filter, ascending by id, bounded
    /// by `query.max`.
    async fn find_stale_ticket_ids(&self, query: &StaleQuery) -> Result<Vec<i64>, StoreError>;

    /// Insert a ticket. Returns the assigned id.
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<i64, StoreError>;

    /// Resolve a ticket by id.
    async fn get_ticket(&self, id: i64) -> Result<Option<Ticket>, StoreError>;

    /// Persist a ticket's mutable fields.
    ///
    /// When `refetch` is true the saved row is re-read and returned; the
    /// sweeper passes false to skip the immediate re-read (an efficiency
    /// contract, not a correctness one).
    async fn save_ticket(
        &self,
        ticket: &Ticket,
        refetch: bool,
    ) -> Result<Option<Ticket>, StoreError>;

    // ── Thread + audit ──────────────────────────────────────────────

    /// Append an entry to a ticket's thread.
    async fn append_thread_entry(
        &self,
        ticket_id: i64,
        kind: crate::tickets::EntryKind,
        title: Option<&str>,
        body: &str,
        poster: &str,
    ) -> Result<(), StoreError>;

    /// All thread entries for a ticket, ascending by id.
    async fn list_thread(&self, ticket_id: i64) -> Result<Vec<ThreadEntry>, StoreError>;

    /// Append an audit event to a ticket.
    async fn append_event(
        &self,
        ticket_id: i64,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// All audit events for a ticket, ascending by id.
    async fn list_events(&self, ticket_id: i64) -> Result<Vec<TicketEvent>, StoreError>;

    // ── Directories ─────────────────────────────────────────────────

    /// Look up a status definition by id.
    async fn lookup_status(&self, id: i64) -> Result<Option<StatusDef>, StoreError>;

    /// Look up a canned response by id.
    async fn lookup_canned(&self, id: i64) -> Result<Option<CannedResponse>, StoreError>;

    /// Look up an agent by id.
    async fn lookup_agent(&self, id: i64) -> Result<Option<Agent>, StoreError>;

    /// Insert a status definition (deployment seeding and tests).
    async fn insert_status(&self, status: &StatusDef) -> Result<(), StoreError>;

    /// Insert a canned response.
    async fn insert_canned(&self, canned: &CannedResponse) -> Result<(), StoreError>;

    /// Insert an agent.
    async fn insert_agent(&self, agent: &Agent) -> Result<(), StoreError>;
}
