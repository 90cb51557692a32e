//! Identity and ticket data model.

pub mod filter;
pub mod ticket;
pub mod user;

use std::fmt;

pub use filter::StatusFilter;
pub use ticket::{NewTicket, Status, Ticket, TicketId, TicketType, Tickets};
pub use user::{Role, User, UserId};

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Lowercase and fold `-`/space to `_` so `In-Progress` parses as `in_progress`.
pub(crate) fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Parse the numeric suffix of a `<prefix>-<n>` identifier.
pub(crate) fn sequence_of(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|n| n.parse().ok())
}
