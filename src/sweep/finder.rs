//! Eligibility finder — selects a group's candidate ticket ids.
//!
//! Validates the group's query parameters (each rejection is its own
//! `InvalidParameter`), then delegates to the store's filtered, ordered,
//! bounded query. Ascending ticket id is the oldest-first proxy under the
//! store's ascending id allocation. No mutation.

use chrono::{DateTime, Duration, Utc};

use crate::config::PolicyGroup;
use crate::error::SweepError;
use crate::store::{StaleQuery, Store};

/// Candidate ticket ids for one policy group, oldest first, at most
/// `group.max_batch` of them.
pub async fn find_candidates(
    store: &dyn Store,
    group: &PolicyGroup,
    now: DateTime<Utc>,
) -> Result<Vec<i64>, SweepError> {
    if group.from_status <= 0 {
        return Err(SweepError::InvalidParameter {
            param: "from_status",
            reason: format!("needs to be > 0, got {}", group.from_status),
        });
    }
    if group.idle_days < 1 {
        return Err(SweepError::InvalidParameter {
            param: "idle_days",
            reason: "needs to be > 0".to_string(),
        });
    }
    if group.max_batch < 1 {
        return Err(SweepError::InvalidParameter {
            param: "max_batch",
            reason: "needs to be > 0".to_string(),
        });
    }

    let query = StaleQuery {
        from_status: group.from_status,
        cutoff: now - Duration::days(i64::from(group.idle_days)),
        only_answered: group.only_answered,
        only_overdue: group.only_overdue,
        max: group.max_batch,
    };

    let ids = store.find_stale_ticket_ids(&query).await?;
    tracing::debug!(
        group = group.id,
        candidates = ids.len(),
        "Eligibility query complete"
    );
    Ok(ids)
}
