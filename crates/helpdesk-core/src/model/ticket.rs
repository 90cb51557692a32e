use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

use super::{ParseEnumError, User, UserId, normalize, sequence_of};

/// The five lifecycle states, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Created,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub const ALL: [Self; 5] = [
        Self::Created,
        Self::Assigned,
        Self::InProgress,
        Self::Resolved,
        Self::Closed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Display label used by views.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Assigned => "Assigned",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Whether a ticket in this state is expected to carry an assignee.
    #[must_use]
    pub const fn expects_assignee(self) -> bool {
        !matches!(self, Self::Created)
    }
}

/// Ticket category. Labels are display-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    #[default]
    Software,
    Hardware,
    Network,
}

impl TicketType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::Hardware => "hardware",
            Self::Network => "network",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Software => "Software",
            Self::Hardware => "Hardware",
            Self::Network => "Network",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "created" => Ok(Self::Created),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for TicketType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "software" => Ok(Self::Software),
            "hardware" => Ok(Self::Hardware),
            "network" => Ok(Self::Network),
            _ => Err(ParseEnumError {
                expected: "ticket type",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    const PREFIX: &'static str = "tk";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Next free `tk-<n>` id: one past the largest numeric suffix in use.
    ///
    /// Ids that do not follow the `tk-<n>` shape are ignored; they can never
    /// collide with a generated id. `None` once the largest suffix is
    /// `u64::MAX`.
    pub fn next_after<'a>(existing: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let max = existing
            .into_iter()
            .filter_map(|id| sequence_of(&id.0, Self::PREFIX))
            .max()
            .unwrap_or(0);
        let next = max.checked_add(1)?;
        Some(Self(format!("{}-{next}", Self::PREFIX)))
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Form input for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub ticket_type: TicketType,
}

impl NewTicket {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        ticket_type: TicketType,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ticket_type,
        }
    }
}

/// A unit of reported work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub status: Status,
    pub requester_id: UserId,
    pub requester_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_report: Option<String>,
}

impl Ticket {
    #[must_use]
    pub fn is_requested_by(&self, user: &User) -> bool {
        self.requester_id == user.id
    }

    #[must_use]
    pub fn is_assigned_to(&self, user: &User) -> bool {
        self.assignee_id.as_ref() == Some(&user.id)
    }
}

/// The ticket collection.
///
/// Replace-on-write: every mutation builds a new `Tickets` that shares the
/// `Arc` of each untouched ticket, so `Arc::ptr_eq` holds across states for
/// tickets that did not change. Order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tickets {
    items: Vec<Arc<Ticket>>,
}

impl Tickets {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Ticket>> {
        self.items.iter()
    }

    #[must_use]
    pub fn get(&self, id: &TicketId) -> Option<&Arc<Ticket>> {
        self.items.iter().find(|t| &t.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &TicketId) -> bool {
        self.get(id).is_some()
    }

    /// Next free `tk-<n>` id, or `None` once the sequence is exhausted.
    #[must_use]
    pub fn next_id(&self) -> Option<TicketId> {
        TicketId::next_after(self.items.iter().map(|t| &t.id))
    }

    /// New collection with `ticket` appended.
    #[must_use]
    pub fn with_appended(&self, ticket: Ticket) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(Arc::new(ticket));
        Self { items }
    }

    /// New collection with the ticket at `id` swapped for `updated`.
    ///
    /// Returns `None` when no ticket has that id.
    #[must_use]
    pub fn with_replaced(&self, id: &TicketId, updated: Ticket) -> Option<Self> {
        let pos = self.items.iter().position(|t| &t.id == id)?;
        let mut items = self.items.clone();
        items[pos] = Arc::new(updated);
        Some(Self { items })
    }
}

impl FromIterator<Ticket> for Tickets {
    fn from_iter<I: IntoIterator<Item = Ticket>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Tickets {
    type Item = &'a Arc<Ticket>;
    type IntoIter = std::slice::Iter<'a, Arc<Ticket>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for Tickets {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(AsRef::<Ticket>::as_ref))
    }
}
