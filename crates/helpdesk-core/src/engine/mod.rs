//! Transition/visibility engine.
//!
//! Pure functions over [`Tickets`](crate::model::Tickets): nothing here holds
//! state, and every mutation returns a new collection.

pub mod ops;
pub mod transition;
pub mod visibility;

pub use ops::{assign, create_ticket, create_ticket_now, set_status, submit_report};
pub use transition::{available_transitions, check_transition, role_allows};
pub use visibility::{can_see, technicians, visible_tickets};
