//! Persistence layer — libSQL-backed storage for tickets, threads, and
//! the directories the sweeper reads.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::{StaleQuery, Store};
