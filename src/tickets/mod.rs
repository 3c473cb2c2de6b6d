//! Ticket domain — items, thread entries, audit events, and directories.

pub mod model;

pub use model::{
    Agent, CannedResponse, EntryKind, StatusDef, ThreadEntry, Ticket, TicketEvent,
};
