//! Error types for the ticket sweeper.

/// Top-level error type for the sweeper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sweep error: {0}")]
    Sweep(#[from] SweepError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Errors that abort a single policy group's batch.
///
/// Anything here is caught at the group boundary: the group is logged as
/// failed and the remaining groups still run.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Invalid parameter {param}: {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    #[error("Target status {id} does not exist")]
    UnknownStatus { id: i64 },

    #[error("Canned response {id} does not exist")]
    UnknownCanned { id: i64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid {field} address: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Send failed: {0}")]
    Send(String),
}

/// Result type alias for the sweeper.
pub type Result<T> = std::result::Result<T, Error>;
