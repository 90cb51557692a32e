//! Per-status counts over a ticket subset.

use serde::Serialize;
use std::sync::Arc;

use crate::model::{Status, Ticket};

/// Ticket counts, recomputed from whatever subset the caller passes in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TicketStats {
    pub total: usize,
    pub created: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
}

impl TicketStats {
    pub fn from_tickets<'a>(tickets: impl IntoIterator<Item = &'a Arc<Ticket>>) -> Self {
        tickets.into_iter().fold(Self::default(), |mut acc, t| {
            acc.record(t.status);
            acc
        })
    }

    const fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Created => self.created += 1,
            Status::Assigned => self.assigned += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Resolved => self.resolved += 1,
            Status::Closed => self.closed += 1,
        }
    }

    #[must_use]
    pub const fn count(&self, status: Status) -> usize {
        match status {
            Status::Created => self.created,
            Status::Assigned => self.assigned,
            Status::InProgress => self.in_progress,
            Status::Resolved => self.resolved,
            Status::Closed => self.closed,
        }
    }

    /// Tickets not yet resolved or closed.
    #[must_use]
    pub const fn open(&self) -> usize {
        self.created + self.assigned + self.in_progress
    }
}
