//! Schedule gate — decides whether a trigger invocation performs work.
//!
//! Pure computation over provided values; the caller persists the returned
//! marker. The marker is rewritten to `now` on every invocation regardless
//! of the decision, so under frequent triggering the due window can keep
//! sliding forward after the first run. `force` is the operational escape
//! hatch when that bites.

use chrono::{DateTime, Duration, Utc};

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// Whether this invocation should sweep.
    pub run: bool,
    /// Value the persisted marker must be rewritten to — always `now`.
    pub new_last_run: DateTime<Utc>,
}

/// Evaluate the gate.
///
/// `frequency_hours == 0` means every trigger is due. A missing marker
/// (first ever invocation) is also due. Otherwise the invocation runs only
/// strictly after `last_run + frequency_hours`.
pub fn evaluate(
    last_run: Option<DateTime<Utc>>,
    frequency_hours: u32,
    force: bool,
    now: DateTime<Utc>,
) -> GateDecision {
    let due = if frequency_hours == 0 {
        true
    } else {
        match last_run {
            None => true,
            Some(last) => now > last + Duration::hours(i64::from(frequency_hours)),
        }
    };

    GateDecision {
        run: force || due,
        new_last_run: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn zero_frequency_is_always_due() {
        let now = at(9);
        for last in [None, Some(at(8)), Some(now)] {
            let decision = evaluate(last, 0, false, now);
            assert!(decision.run);
        }
    }

    #[test]
    fn missing_marker_is_due() {
        assert!(evaluate(None, 24, false, at(9)).run);
    }

    #[test]
    fn inside_window_does_not_run() {
        // last run 08:00, frequency 6h, now 09:00 → next due after 14:00
        let decision = evaluate(Some(at(8)), 6, false, at(9));
        assert!(!decision.run);
    }

    #[test]
    fn exactly_at_window_boundary_does_not_run() {
        // strict comparison: now == last + freq is not yet due
        let decision = evaluate(Some(at(8)), 1, false, at(9));
        assert!(!decision.run);
    }

    #[test]
    fn past_window_runs() {
        let decision = evaluate(Some(at(2)), 6, false, at(9));
        assert!(decision.run);
    }

    #[test]
    fn force_overrides_window() {
        let decision = evaluate(Some(at(8)), 6, true, at(9));
        assert!(decision.run);
    }

    #[test]
    fn marker_is_rewritten_even_when_not_running() {
        let now = at(9);
        let decision = evaluate(Some(at(8)), 6, false, now);
        assert!(!decision.run);
        assert_eq!(decision.new_last_run, now);
    }

    #[test]
    fn marker_is_rewritten_when_running() {
        let now = at(9);
        let decision = evaluate(Some(at(1)), 6, false, now);
        assert!(decision.run);
        assert_eq!(decision.new_last_run, now);
    }
}
