//! Sweeper configuration — run settings and policy groups.
//!
//! Loaded from a JSON file (path via `TICKET_SWEEPER_CONFIG`). Each policy
//! group is an independent aging rule: which status to pull from, how long a
//! ticket must sit untouched, optional answered/overdue filters, a batch
//! bound, the target status, and optional note/reply content.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One independently configured aging rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyGroup {
    /// Unique group id; groups run in ascending id order.
    pub id: u32,
    /// Optional display name, used only in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Disabled groups contribute zero candidates and are never queried.
    #[serde(default)]
    pub enabled: bool,
    /// Status tickets are selected from.
    pub from_status: i64,
    /// Minimum days since last update for a ticket to qualify.
    pub idle_days: u32,
    /// Only select tickets that have an agent answer.
    #[serde(default)]
    pub only_answered: bool,
    /// Only select tickets flagged overdue.
    #[serde(default)]
    pub only_overdue: bool,
    /// Upper bound on candidates per run.
    pub max_batch: u32,
    /// Status tickets are transitioned to.
    pub to_status: i64,
    /// Internal note posted to each ticket before the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
    /// Canned response sent to the requester before the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_canned_id: Option<i64>,
}

impl PolicyGroup {
    /// Log label: `"group 3"` or `"group 3 (ancient open)"`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("group {} ({})", self.id, name),
            None => format!("group {}", self.id),
        }
    }
}

/// Top-level sweeper configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Hours between sweeps. 0 means every trigger is due.
    #[serde(default)]
    pub frequency_hours: u32,
    /// Force every trigger to sweep regardless of the schedule marker.
    #[serde(default)]
    pub force_run: bool,
    /// Agent used to send every auto-reply in place of ticket assignees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robot_agent_id: Option<i64>,
    /// Policy groups, kept sorted ascending by id after load.
    #[serde(default)]
    pub groups: Vec<PolicyGroup>,
}

impl SweeperConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut config: SweeperConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.groups.sort_by_key(|g| g.id);
        config.validate()?;
        Ok(config)
    }

    /// Validate group invariants: unique ids, and enabled groups must carry
    /// a usable threshold and batch bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pair in self.groups.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(ConfigError::InvalidValue {
                    key: format!("groups[{}].id", pair[1].id),
                    message: "duplicate group id".to_string(),
                });
            }
        }

        for group in &self.groups {
            if !group.enabled {
                continue;
            }
            if group.idle_days == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("groups[{}].idle_days", group.id),
                    message: "enabled group requires idle_days >= 1".to_string(),
                });
            }
            if group.max_batch == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("groups[{}].max_batch", group.id),
                    message: "enabled group requires max_batch >= 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Enabled groups in ascending id order. Disabled groups are skipped
    /// silently (debug log only).
    pub fn enabled_groups(&self) -> impl Iterator<Item = &PolicyGroup> {
        self.groups.iter().filter(|group| {
            if !group.enabled {
                tracing::debug!(group = group.id, "Group is not enabled, skipping");
            }
            group.enabled
        })
    }
}
