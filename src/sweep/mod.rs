//! Sweep pipeline — schedule gate, policy-group iteration, eligibility
//! selection, and transition execution.
//!
//! An external periodic trigger (the interval loop in `spawn_sweep_loop`)
//! invokes `Sweeper::run`. The gate decides whether this invocation does
//! any work; if so, enabled groups run strictly in ascending id order and
//! each group's failures stay inside that group.

pub mod executor;
pub mod finder;
pub mod gate;
pub mod notify;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::channels::ReplyChannel;
use crate::config::SweeperConfig;
use crate::error::{Error, SweepError};
use crate::store::Store;
use crate::tickets::Agent;

pub use executor::{GroupReport, TicketOutcome};
pub use gate::GateDecision;
pub use notify::NotificationOutcome;

/// Poster name for everything the sweeper writes to ticket threads.
pub const AUTOMATION_POSTER: &str = "Ticket Sweeper";

/// Result of one group within a run.
#[derive(Debug)]
pub struct GroupRun {
    pub group_id: u32,
    pub label: String,
    pub result: Result<GroupReport, SweepError>,
}

/// Aggregated result of one trigger invocation.
///
/// The trigger itself ignores this; it exists for logging and tests.
#[derive(Debug)]
pub struct RunReport {
    /// False when the gate decided this invocation was not due.
    pub executed: bool,
    pub groups: Vec<GroupRun>,
}

impl RunReport {
    /// Total tickets transitioned across all groups.
    pub fn transitioned(&self) -> usize {
        self.groups
            .iter()
            .filter_map(|g| g.result.as_ref().ok())
            .map(|r| r.transitioned)
            .sum()
    }

    /// Number of groups that failed outright.
    pub fn failed_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.result.is_err()).count()
    }
}

/// The sweep job: ages out stale tickets per the configured policy groups.
pub struct Sweeper {
    config: SweeperConfig,
    store: Arc<dyn Store>,
    channel: Arc<dyn ReplyChannel>,
}

impl Sweeper {
    pub fn new(
        config: SweeperConfig,
        store: Arc<dyn Store>,
        channel: Arc<dyn ReplyChannel>,
    ) -> Self {
        Self {
            config,
            store,
            channel,
        }
    }

    /// One trigger invocation.
    ///
    /// The schedule marker is rewritten on every invocation, run or not
    /// (see the gate module for the consequences). A group failure never
    /// aborts the run; remaining groups still sweep.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, Error> {
        let last = self.store.last_sweep_at().await?;
        let decision = gate::evaluate(last, self.config.frequency_hours, self.config.force_run, now);
        self.store.record_sweep_at(decision.new_last_run).await?;

        if !decision.run {
            debug!("Sweep not due yet");
            return Ok(RunReport {
                executed: false,
                groups: Vec::new(),
            });
        }

        let robot = self.resolve_robot().await;
        let mut groups = Vec::new();

        for group in self.config.enabled_groups() {
            let result =
                executor::run_group(&*self.store, &*self.channel, group, robot.as_ref(), now).await;

            match &result {
                Ok(report) => {
                    info!(
                        group = %group.label(),
                        matched = report.matched,
                        transitioned = report.transitioned,
                        "Group swept"
                    );
                }
                Err(e) => {
                    // Something borked in this group; soldier on with the rest.
                    error!(group = %group.label(), "Group failed: {e}");
                }
            }

            groups.push(GroupRun {
                group_id: group.id,
                label: group.label(),
                result,
            });
        }

        Ok(RunReport {
            executed: true,
            groups,
        })
    }

    /// Resolve the configured robot account once for the whole run.
    ///
    /// A missing or unresolvable account falls back to per-ticket assignees.
    async fn resolve_robot(&self) -> Option<Agent> {
        let id = self.config.robot_agent_id?;
        match self.store.lookup_agent(id).await {
            Ok(Some(agent)) => Some(agent),
            Ok(None) => {
                warn!(agent_id = id, "Configured robot account not found");
                None
            }
            Err(e) => {
                warn!(agent_id = id, "Failed to resolve robot account: {e}");
                None
            }
        }
    }

    /// One-time administrative alert for when the sweeper is being removed:
    /// stale tickets will stop being aged out.
    pub async fn decommission(&self) -> Result<(), Error> {
        self.channel
            .admin_alert(
                "Ticket sweeper disabled",
                "The ticket sweeper has been removed. Old open tickets will remain active.",
            )
            .await?;
        info!("Decommission alert sent");
        Ok(())
    }
}

/// Spawn the periodic trigger loop. The first tick fires immediately; the
/// gate decides whether each tick actually sweeps.
pub fn spawn_sweep_loop(sweeper: Arc<Sweeper>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Sweep loop started");

        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            match sweeper.run(Utc::now()).await {
                Ok(report) if report.executed => {
                    info!(
                        transitioned = report.transitioned(),
                        failed_groups = report.failed_groups(),
                        "Sweep complete"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Sweep failed: {e}");
                }
            }
        }
    })
}
