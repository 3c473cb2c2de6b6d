use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use ticket_sweeper::channels::{LogChannel, ReplyChannel, SmtpChannel, SmtpConfig};
use ticket_sweeper::config::SweeperConfig;
use ticket_sweeper::store::{LibSqlStore, Store};
use ticket_sweeper::sweep::{Sweeper, spawn_sweep_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_path = std::env::var("TICKET_SWEEPER_CONFIG")
        .unwrap_or_else(|_| "./config/sweeper.json".to_string());
    let config = SweeperConfig::load(Path::new(&config_path))
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    let db_path = std::env::var("TICKET_SWEEPER_DB_PATH")
        .unwrap_or_else(|_| "./data/tickets.db".to_string());

    let check_interval_secs: u64 = std::env::var("TICKET_SWEEPER_CHECK_INTERVAL_SECS")
        .unwrap_or_else(|_| "300".to_string())
        .parse()
        .unwrap_or(300);

    eprintln!("🧹 Ticket Sweeper v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Config: {config_path}");
    eprintln!("   Database: {db_path}");
    eprintln!(
        "   Groups: {} ({} enabled)",
        config.groups.len(),
        config.enabled_groups().count()
    );
    eprintln!("   Trigger interval: {check_interval_secs}s\n");

    let store: Arc<dyn Store> = Arc::new(
        LibSqlStore::new_local(Path::new(&db_path))
            .await
            .with_context(|| format!("Failed to open database at {db_path}"))?,
    );

    let channel: Arc<dyn ReplyChannel> = match SmtpConfig::from_env() {
        Some(smtp) => {
            eprintln!("   SMTP: {}:{}\n", smtp.host, smtp.port);
            Arc::new(SmtpChannel::new(smtp))
        }
        None => {
            eprintln!("   SMTP: not configured, replies are logged only\n");
            Arc::new(LogChannel)
        }
    };

    let sweeper = Arc::new(Sweeper::new(config, store, channel));

    // `ticket-sweeper decommission` sends the removal alert and exits.
    if std::env::args().nth(1).as_deref() == Some("decommission") {
        sweeper.decommission().await?;
        return Ok(());
    }

    let loop_handle = spawn_sweep_loop(sweeper, Duration::from_secs(check_interval_secs));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");
    loop_handle.abort();

    Ok(())
}
