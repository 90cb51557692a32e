//! helpdesk-core library.
//!
//! Role-based helpdesk tickets: who may see which tickets, and which status
//! moves each role may make. All state is in memory and immutable; every
//! operation returns a new value.
//!
//! # Conventions
//!
//! - **Errors**: library operations return `thiserror` enums carrying an
//!   [`ErrorCode`]; file loading returns `anyhow::Result` with context.
//! - **Logging**: use `tracing` macros (`info!` per mutation, `debug!` per
//!   intent, `warn!` for allowed-but-suspicious operations).

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod seed;
pub mod session;
pub mod stats;

pub use error::{EngineError, ErrorCode, SessionError};
pub use model::{
    NewTicket, Role, Status, StatusFilter, Ticket, TicketId, TicketType, Tickets, User, UserId,
};
pub use session::{AppState, Intent, View};
pub use stats::TicketStats;
