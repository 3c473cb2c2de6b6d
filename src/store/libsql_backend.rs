//! libSQL store — async `Store` trait implementation.
//!
//! Supports local file and in-memory databases. Timestamps are written as
//! RFC 3339 strings; reads also accept SQLite `datetime()` output.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::{StaleQuery, Store};
use crate::tickets::{
    Agent, CannedResponse, EntryKind, StatusDef, ThreadEntry, Ticket, TicketEvent,
};

/// libSQL store backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(store.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(store.conn()).await?;
        Ok(store)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<i64>` to libsql Value.
fn opt_int(v: Option<i64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Integer(v),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a Ticket.
///
/// Column order matches TICKET_COLUMNS:
/// 0:id, 1:subject, 2:requester_name, 3:requester_email, 4:assignee_id,
/// 5:status_id, 6:is_answered, 7:is_overdue, 8:due_at, 9:closed_at,
/// 10:last_update, 11:created_at, 12:open_subtasks, 13:missing_required_fields
fn row_to_ticket(row: &libsql::Row) -> Result<Ticket, libsql::Error> {
    let due_str: Option<String> = row.get(8).ok();
    let closed_str: Option<String> = row.get(9).ok();
    let last_update_str: String = row.get(10)?;
    let created_str: String = row.get(11)?;

    Ok(Ticket {
        id: row.get(0)?,
        subject: row.get(1)?,
        requester_name: row.get(2)?,
        requester_email: row.get(3)?,
        assignee_id: row.get(4).ok(),
        status_id: row.get(5)?,
        is_answered: row.get::<i64>(6)? != 0,
        is_overdue: row.get::<i64>(7)? != 0,
        due_at: parse_optional_datetime(&due_str),
        closed_at: parse_optional_datetime(&closed_str),
        last_update: parse_datetime(&last_update_str),
        created_at: parse_datetime(&created_str),
        open_subtasks: row.get(12)?,
        missing_required_fields: row.get::<i64>(13)? != 0,
    })
}

/// Map a libsql Row to a ThreadEntry.
fn row_to_entry(row: &libsql::Row) -> Result<ThreadEntry, libsql::Error> {
    let kind_str: String = row.get(2)?;
    let created_str: String = row.get(6)?;

    Ok(ThreadEntry {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        kind: EntryKind::from_tag(&kind_str).unwrap_or(EntryKind::Note),
        title: row.get(3).ok(),
        body: row.get(4)?,
        poster: row.get(5)?,
        created_at: parse_datetime(&created_str),
    })
}

/// Map a libsql Row to a TicketEvent.
fn row_to_event(row: &libsql::Row) -> Result<TicketEvent, libsql::Error> {
    let payload_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;

    Ok(TicketEvent {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        event_type: row.get(2)?,
        payload: serde_json::from_str(&payload_str).unwrap_or_default(),
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const TICKET_COLUMNS: &str = "id, subject, requester_name, requester_email, assignee_id, \
     status_id, is_answered, is_overdue, due_at, closed_at, last_update, created_at, \
     open_subtasks, missing_required_fields";

const ENTRY_COLUMNS: &str = "id, ticket_id, kind, title, body, poster, created_at";

const EVENT_COLUMNS: &str = "id, ticket_id, event_type, payload, created_at";

#[async_trait]
impl Store for LibSqlStore {
    // ── Schedule state ──────────────────────────────────────────────

    async fn last_sweep_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT last_run_at FROM sweep_state WHERE id = 1", ())
            .await
            .map_err(|e| StoreError::Query(format!("last_sweep_at: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: Option<String> = row.get(0).ok();
                Ok(parse_optional_datetime(&raw))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("last_sweep_at: {e}"))),
        }
    }

    async fn record_sweep_at(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT INTO sweep_state (id, last_run_at) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET last_run_at = excluded.last_run_at",
                params![at.to_rfc3339()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("record_sweep_at: {e}")))?;
        debug!(at = %at, "Sweep marker recorded");
        Ok(())
    }

    // ── Tickets ─────────────────────────────────────────────────────

    async fn find_stale_ticket_ids(&self, query: &StaleQuery) -> Result<Vec<i64>, StoreError> {
        let mut filter = String::new();
        if query.only_answered {
            filter.push_str(" AND is_answered = 1");
        }
        if query.only_overdue {
            filter.push_str(" AND is_overdue = 1");
        }

        let sql = format!(
            "SELECT id FROM tickets WHERE status_id = ?1 AND last_update < ?2{filter} \
             ORDER BY id ASC LIMIT ?3"
        );
        debug!(sql = %sql, "Looking for stale tickets");

        let mut rows = self
            .conn()
            .query(
                &sql,
                params![query.from_status, query.cutoff.to_rfc3339(), query.max as i64],
            )
            .await
            .map_err(|e| StoreError::Query(format!("find_stale_ticket_ids: {e}")))?;

        let mut ids = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            ids.push(
                row.get::<i64>(0)
                    .map_err(|e| StoreError::Query(format!("find_stale_ticket_ids row: {e}")))?,
            );
        }
        Ok(ids)
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tickets (subject, requester_name, requester_email, assignee_id, \
             status_id, is_answered, is_overdue, due_at, closed_at, last_update, created_at, \
             open_subtasks, missing_required_fields) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                ticket.subject.clone(),
                ticket.requester_name.clone(),
                ticket.requester_email.clone(),
                opt_int(ticket.assignee_id),
                ticket.status_id,
                ticket.is_answered as i64,
                ticket.is_overdue as i64,
                opt_text_owned(ticket.due_at.map(|d| d.to_rfc3339())),
                opt_text_owned(ticket.closed_at.map(|d| d.to_rfc3339())),
                ticket.last_update.to_rfc3339(),
                ticket.created_at.to_rfc3339(),
                ticket.open_subtasks,
                ticket.missing_required_fields as i64,
            ],
        )
        .await
        .map_err(|e| StoreError::Query(format!("insert_ticket: {e}")))?;

        let id = conn.last_insert_rowid();
        debug!(ticket_id = id, "Ticket inserted");
        Ok(id)
    }

    async fn get_ticket(&self, id: i64) -> Result<Option<Ticket>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_ticket: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let ticket = row_to_ticket(&row)
                    .map_err(|e| StoreError::Query(format!("get_ticket row parse: {e}")))?;
                Ok(Some(ticket))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_ticket: {e}"))),
        }
    }

    async fn save_ticket(
        &self,
        ticket: &Ticket,
        refetch: bool,
    ) -> Result<Option<Ticket>, StoreError> {
        self.conn()
            .execute(
                "UPDATE tickets SET subject = ?1, assignee_id = ?2, status_id = ?3, \
                 is_answered = ?4, is_overdue = ?5, due_at = ?6, closed_at = ?7, \
                 last_update = ?8, open_subtasks = ?9, missing_required_fields = ?10 \
                 WHERE id = ?11",
                params![
                    ticket.subject.clone(),
                    opt_int(ticket.assignee_id),
                    ticket.status_id,
                    ticket.is_answered as i64,
                    ticket.is_overdue as i64,
                    opt_text_owned(ticket.due_at.map(|d| d.to_rfc3339())),
                    opt_text_owned(ticket.closed_at.map(|d| d.to_rfc3339())),
                    ticket.last_update.to_rfc3339(),
                    ticket.open_subtasks,
                    ticket.missing_required_fields as i64,
                    ticket.id,
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("save_ticket: {e}")))?;

        debug!(ticket_id = ticket.id, refetch, "Ticket saved");

        if refetch {
            self.get_ticket(ticket.id).await
        } else {
            Ok(None)
        }
    }

    // ── Thread + audit ──────────────────────────────────────────────

    async fn append_thread_entry(
        &self,
        ticket_id: i64,
        kind: EntryKind,
        title: Option<&str>,
        body: &str,
        poster: &str,
    ) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT INTO thread_entries (ticket_id, kind, title, body, poster, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    ticket_id,
                    kind.type_tag(),
                    opt_text_owned(title.map(String::from)),
                    body,
                    poster,
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("append_thread_entry: {e}")))?;
        debug!(ticket_id, kind = kind.type_tag(), "Thread entry appended");
        Ok(())
    }

    async fn list_thread(&self, ticket_id: i64) -> Result<Vec<ThreadEntry>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM thread_entries WHERE ticket_id = ?1 \
                     ORDER BY id ASC"
                ),
                params![ticket_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_thread: {e}")))?;

        let mut entries = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_entry(&row) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Skipping thread entry row: {e}");
                }
            }
        }
        Ok(entries)
    }

    async fn append_event(
        &self,
        ticket_id: i64,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT INTO ticket_events (ticket_id, event_type, payload, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    ticket_id,
                    event_type,
                    payload.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("append_event: {e}")))?;
        debug!(ticket_id, event_type, "Event appended");
        Ok(())
    }

    async fn list_events(&self, ticket_id: i64) -> Result<Vec<TicketEvent>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM ticket_events WHERE ticket_id = ?1 \
                     ORDER BY id ASC"
                ),
                params![ticket_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_events: {e}")))?;

        let mut events = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_event(&row) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!("Skipping event row: {e}");
                }
            }
        }
        Ok(events)
    }

    // ── Directories ─────────────────────────────────────────────────

    async fn lookup_status(&self, id: i64) -> Result<Option<StatusDef>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, name, state FROM statuses WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("lookup_status: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(StatusDef {
                id: row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("lookup_status row: {e}")))?,
                name: row
                    .get(1)
                    .map_err(|e| StoreError::Query(format!("lookup_status row: {e}")))?,
                state: row
                    .get(2)
                    .map_err(|e| StoreError::Query(format!("lookup_status row: {e}")))?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("lookup_status: {e}"))),
        }
    }

    async fn lookup_canned(&self, id: i64) -> Result<Option<CannedResponse>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, title, body FROM canned_responses WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("lookup_canned: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(CannedResponse {
                id: row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("lookup_canned row: {e}")))?,
                title: row
                    .get(1)
                    .map_err(|e| StoreError::Query(format!("lookup_canned row: {e}")))?,
                body: row
                    .get(2)
                    .map_err(|e| StoreError::Query(format!("lookup_canned row: {e}")))?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("lookup_canned: {e}"))),
        }
    }

    async fn lookup_agent(&self, id: i64) -> Result<Option<Agent>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, name, email FROM agents WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("lookup_agent: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(Agent {
                id: row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("lookup_agent row: {e}")))?,
                name: row
                    .get(1)
                    .map_err(|e| StoreError::Query(format!("lookup_agent row: {e}")))?,
                email: row
                    .get(2)
                    .map_err(|e| StoreError::Query(format!("lookup_agent row: {e}")))?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("lookup_agent: {e}"))),
        }
    }

    async fn insert_status(&self, status: &StatusDef) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO statuses (id, name, state) VALUES (?1, ?2, ?3)",
                params![status.id, status.name.clone(), status.state.clone()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert_status: {e}")))?;
        Ok(())
    }

    async fn insert_canned(&self, canned: &CannedResponse) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO canned_responses (id, title, body) VALUES (?1, ?2, ?3)",
                params![canned.id, canned.title.clone(), canned.body.clone()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert_canned: {e}")))?;
        Ok(())
    }

    async fn insert_agent(&self, agent: &Agent) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO agents (id, name, email) VALUES (?1, ?2, ?3)",
                params![agent.id, agent.name.clone(), agent.email.clone()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert_agent: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    async fn memory_store() -> LibSqlStore {
        LibSqlStore::new_memory().await.unwrap()
    }

    fn stale_query(from_status: i64, cutoff: DateTime<Utc>, max: u32) -> StaleQuery {
        StaleQuery {
            from_status,
            cutoff,
            only_answered: false,
            only_overdue: false,
            max,
        }
    }

    #[tokio::test]
    async fn ticket_insert_get_roundtrip() {
        let store = memory_store().await;
        let ticket = Ticket::new("Broken keyboard", "Mia", "mia@example.com", 2)
            .with_assignee(3)
            .answered();

        let id = store.insert_ticket(&ticket).await.unwrap();
        assert!(id > 0);

        let loaded = store.get_ticket(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.subject, "Broken keyboard");
        assert_eq!(loaded.assignee_id, Some(3));
        assert!(loaded.is_answered);
        assert!(loaded.due_at.is_none());
        assert!(loaded.closed_at.is_none());
    }

    #[tokio::test]
    async fn get_missing_ticket_returns_none() {
        let store = memory_store().await;
        assert!(store.get_ticket(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_ascending() {
        let store = memory_store().await;
        let a = store
            .insert_ticket(&Ticket::new("a", "r", "r@example.com", 2))
            .await
            .unwrap();
        let b = store
            .insert_ticket(&Ticket::new("b", "r", "r@example.com", 2))
            .await
            .unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn stale_query_filters_by_status_and_age() {
        let store = memory_store().await;
        let now = Utc::now();

        let old = Ticket::new("old", "r", "r@example.com", 2)
            .with_last_update(now - Duration::days(40));
        let fresh = Ticket::new("fresh", "r", "r@example.com", 2)
            .with_last_update(now - Duration::days(10));
        let wrong_status = Ticket::new("other", "r", "r@example.com", 3)
            .with_last_update(now - Duration::days(40));

        let old_id = store.insert_ticket(&old).await.unwrap();
        store.insert_ticket(&fresh).await.unwrap();
        store.insert_ticket(&wrong_status).await.unwrap();

        let ids = store
            .find_stale_ticket_ids(&stale_query(2, now - Duration::days(30), 10))
            .await
            .unwrap();
        assert_eq!(ids, vec![old_id]);
    }

    #[tokio::test]
    async fn stale_query_respects_limit_and_order() {
        let store = memory_store().await;
        let now = Utc::now();

        let mut ids = Vec::new();
        for i in 0..5 {
            let ticket = Ticket::new(format!("t{i}"), "r", "r@example.com", 2)
                .with_last_update(now - Duration::days(60));
            ids.push(store.insert_ticket(&ticket).await.unwrap());
        }

        let found = store
            .find_stale_ticket_ids(&stale_query(2, now - Duration::days(30), 3))
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found, ids[..3].to_vec());
        assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn stale_query_answered_filter() {
        let store = memory_store().await;
        let now = Utc::now();

        let answered = Ticket::new("a", "r", "r@example.com", 2)
            .with_last_update(now - Duration::days(40))
            .answered();
        let unanswered =
            Ticket::new("u", "r", "r@example.com", 2).with_last_update(now - Duration::days(40));

        let answered_id = store.insert_ticket(&answered).await.unwrap();
        store.insert_ticket(&unanswered).await.unwrap();

        let mut query = stale_query(2, now - Duration::days(30), 10);
        query.only_answered = true;
        let ids = store.find_stale_ticket_ids(&query).await.unwrap();
        assert_eq!(ids, vec![answered_id]);
    }

    #[tokio::test]
    async fn stale_query_overdue_filter() {
        let store = memory_store().await;
        let now = Utc::now();

        let overdue = Ticket::new("o", "r", "r@example.com", 2)
            .with_last_update(now - Duration::days(40))
            .overdue_since(now - Duration::days(35));
        let on_time =
            Ticket::new("t", "r", "r@example.com", 2).with_last_update(now - Duration::days(40));

        let overdue_id = store.insert_ticket(&overdue).await.unwrap();
        store.insert_ticket(&on_time).await.unwrap();

        let mut query = stale_query(2, now - Duration::days(30), 10);
        query.only_overdue = true;
        let ids = store.find_stale_ticket_ids(&query).await.unwrap();
        assert_eq!(ids, vec![overdue_id]);
    }

    #[tokio::test]
    async fn save_ticket_persists_mutations() {
        let store = memory_store().await;
        let now = Utc::now();
        let id = store
            .insert_ticket(
                &Ticket::new("t", "r", "r@example.com", 2).overdue_since(now - Duration::days(5)),
            )
            .await
            .unwrap();

        let mut ticket = store.get_ticket(id).await.unwrap().unwrap();
        ticket.status_id = 4;
        ticket.closed_at = Some(now);
        ticket.last_update = now;
        ticket.due_at = None;
        ticket.is_overdue = false;

        let refetched = store.save_ticket(&ticket, true).await.unwrap().unwrap();
        assert_eq!(refetched.status_id, 4);
        assert!(refetched.closed_at.is_some());
        assert!(refetched.due_at.is_none());
        assert!(!refetched.is_overdue);
    }

    #[tokio::test]
    async fn save_ticket_suppressed_refetch_returns_none() {
        let store = memory_store().await;
        let id = store
            .insert_ticket(&Ticket::new("t", "r", "r@example.com", 2))
            .await
            .unwrap();
        let ticket = store.get_ticket(id).await.unwrap().unwrap();
        assert!(store.save_ticket(&ticket, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn thread_entries_append_and_list_in_order() {
        let store = memory_store().await;
        let id = store
            .insert_ticket(&Ticket::new("t", "r", "r@example.com", 2))
            .await
            .unwrap();

        store
            .append_thread_entry(id, EntryKind::Message, None, "help me", "Mia")
            .await
            .unwrap();
        store
            .append_thread_entry(id, EntryKind::Response, None, "on it", "Agent Bob")
            .await
            .unwrap();
        store
            .append_thread_entry(id, EntryKind::Note, Some("internal"), "looks stale", "Bot")
            .await
            .unwrap();

        let thread = store.list_thread(id).await.unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].kind, EntryKind::Message);
        assert_eq!(thread[1].body, "on it");
        assert_eq!(thread[2].title.as_deref(), Some("internal"));
    }

    #[tokio::test]
    async fn events_append_and_list() {
        let store = memory_store().await;
        let id = store
            .insert_ticket(&Ticket::new("t", "r", "r@example.com", 2))
            .await
            .unwrap();

        store
            .append_event(id, "closed", &serde_json::json!({"status": [4, "Closed"]}))
            .await
            .unwrap();

        let events = store.list_events(id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "closed");
        assert_eq!(events[0].payload["status"][0], 4);
    }

    #[tokio::test]
    async fn directory_lookups() {
        let store = memory_store().await;
        store
            .insert_status(&StatusDef {
                id: 4,
                name: "Closed".into(),
                state: "closed".into(),
            })
            .await
            .unwrap();
        store
            .insert_canned(&CannedResponse {
                id: 1,
                title: "Auto close".into(),
                body: "Closing due to inactivity.".into(),
            })
            .await
            .unwrap();
        store
            .insert_agent(&Agent {
                id: 7,
                name: "Robot".into(),
                email: "robot@example.com".into(),
            })
            .await
            .unwrap();

        assert_eq!(store.lookup_status(4).await.unwrap().unwrap().state, "closed");
        assert_eq!(
            store.lookup_canned(1).await.unwrap().unwrap().title,
            "Auto close"
        );
        assert_eq!(
            store.lookup_agent(7).await.unwrap().unwrap().email,
            "robot@example.com"
        );
        assert!(store.lookup_status(99).await.unwrap().is_none());
        assert!(store.lookup_canned(99).await.unwrap().is_none());
        assert!(store.lookup_agent(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_marker_roundtrip() {
        let store = memory_store().await;
        assert!(store.last_sweep_at().await.unwrap().is_none());

        let at = Utc::now();
        store.record_sweep_at(at).await.unwrap();
        let loaded = store.last_sweep_at().await.unwrap().unwrap();
        assert!((loaded - at).num_seconds().abs() < 1);

        // Marker is a single row; a second write overwrites it.
        let later = at + Duration::hours(2);
        store.record_sweep_at(later).await.unwrap();
        let loaded = store.last_sweep_at().await.unwrap().unwrap();
        assert!((loaded - later).num_seconds().abs() < 1);
    }

    #[tokio::test]
    async fn file_backed_store_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.db");
        let store = LibSqlStore::new_local(&path).await.unwrap();
        let id = store
            .insert_ticket(&Ticket::new("t", "r", "r@example.com", 2))
            .await
            .unwrap();
        assert!(store.get_ticket(id).await.unwrap().is_some());
    }
}
