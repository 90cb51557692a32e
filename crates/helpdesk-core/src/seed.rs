//! Mock data a session starts from.
//!
//! Sessions are seeded either from the built-in directory below or from a
//! seed file (TOML, or JSON when the extension is `.json`):
//!
//! ```toml
//! [[users]]
//! id = "1"
//! username = "user1"
//! role = "user"
//!
//! [[tickets]]
//! title = "Outlook keeps crashing"
//! description = "Crashes when opening attachments"
//! type = "software"
//! requester = "user1"
//! ```
//!
//! Tickets name their requester and assignee by username; names are resolved
//! to ids while loading. Tickets without an `id` get the next `tk-<n>`.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::ErrorCode;
use crate::model::{Role, Status, Ticket, TicketId, TicketType, Tickets, User, UserId};
use crate::session::AppState;

/// Inconsistencies found while validating seed data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("duplicate user {field} '{value}'")]
    DuplicateUser { field: &'static str, value: String },

    #[error("duplicate ticket id '{id}'")]
    DuplicateTicket { id: TicketId },

    #[error("ticket '{ticket}' names unknown user '{username}'")]
    UnknownUser { ticket: TicketId, username: String },

    #[error("ticket '{ticket}': {username} is a {role}, expected a {expected}")]
    WrongRole {
        ticket: TicketId,
        username: String,
        role: Role,
        expected: Role,
    },

    #[error("ticket '{ticket}' is {status} but {problem}")]
    AssigneeMismatch {
        ticket: TicketId,
        status: Status,
        problem: &'static str,
    },

    #[error("ticket '{ticket}' has an empty {field}")]
    BlankField {
        ticket: TicketId,
        field: &'static str,
    },

    #[error("ticket '{ticket}' is {status} and cannot carry a completion report")]
    PrematureReport { ticket: TicketId, status: Status },

    #[error("{kind} id '{id}' leaves no room for generated ids")]
    SequenceExhausted { kind: &'static str, id: String },
}

impl SeedError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::SeedInvalid
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    tickets: Vec<SeedTicket>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedTicket {
    #[serde(default)]
    id: Option<TicketId>,
    title: String,
    description: String,
    #[serde(rename = "type", default)]
    ticket_type: TicketType,
    #[serde(default = "default_status")]
    status: Status,
    requester: String,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completion_report: Option<String>,
}

const fn default_status() -> Status {
    Status::Created
}

/// A validated directory plus ticket set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub users: Vec<User>,
    pub tickets: Tickets,
}

impl Seed {
    /// The logged-out session over this data.
    #[must_use]
    pub fn into_state(self) -> AppState {
        AppState::new(self.users, self.tickets)
    }
}

/// The built-in mock directory and a handful of tickets across statuses.
///
/// # Errors
///
/// Returns the [`SeedError`] if the built-in table fails validation.
pub fn builtin() -> Result<Seed, SeedError> {
    let users = vec![
        User::new("1", "user1", Role::User),
        User::new("2", "admin", Role::Admin),
        User::new("3", "tech1", Role::Technician),
        User::new("4", "alice", Role::User),
        User::new("5", "bob", Role::Technician),
        User::new("6", "carol", Role::Technician),
    ];

    let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).single();
    let raw = vec![
        SeedTicket::new("Outlook keeps crashing", "Crashes when opening attachments", TicketType::Software, "user1")
            .at(day(1, 9)),
        SeedTicket::new("No Wi-Fi on floor 3", "Access point LED is off", TicketType::Network, "alice")
            .at(day(2, 10))
            .worked_by("tech1", Status::Assigned),
        SeedTicket::new("Monitor flickers", "Second screen flickers after lunch", TicketType::Hardware, "user1")
            .at(day(3, 14))
            .worked_by("bob", Status::InProgress),
        SeedTicket::new("IDE license", "Need a license for the new IDE", TicketType::Software, "alice")
            .at(day(4, 11))
            .worked_by("tech1", Status::Resolved)
            .reported("License key sent by mail"),
        SeedTicket::new("Replace keyboard", "Space bar sticks", TicketType::Hardware, "user1")
            .at(day(5, 16))
            .worked_by("bob", Status::Closed)
            .reported("Keyboard swapped"),
    ];

    build(users, raw, DateTime::<Utc>::UNIX_EPOCH)
}

impl SeedTicket {
    fn new(title: &str, description: &str, ticket_type: TicketType, requester: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            description: description.to_string(),
            ticket_type,
            status: Status::Created,
            requester: requester.to_string(),
            assignee: None,
            created_at: None,
            completion_report: None,
        }
    }

    const fn at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    fn worked_by(mut self, assignee: &str, status: Status) -> Self {
        self.assignee = Some(assignee.to_string());
        self.status = status;
        self
    }

    fn reported(mut self, report: &str) -> Self {
        self.completion_report = Some(report.to_string());
        self
    }
}

/// Load and validate a seed file.
///
/// `loaded_at` stamps tickets that carry no `created_at`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if its contents
/// fail validation (see [`SeedError`]).
pub fn load_seed(path: &Path, loaded_at: DateTime<Utc>) -> Result<Seed> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let file: SeedFile = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?
    };

    let seed = build(file.users, file.tickets, loaded_at)
        .with_context(|| format!("Invalid seed data in {}", path.display()))?;
    tracing::debug!(
        users = seed.users.len(),
        tickets = seed.tickets.len(),
        path = %path.display(),
        "seed loaded"
    );
    Ok(seed)
}

fn build(
    users: Vec<User>,
    raw: Vec<SeedTicket>,
    loaded_at: DateTime<Utc>,
) -> Result<Seed, SeedError> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for user in &users {
        if !ids.insert(&user.id) {
            return Err(SeedError::DuplicateUser {
                field: "id",
                value: user.id.to_string(),
            });
        }
        if !names.insert(user.username.as_str()) {
            return Err(SeedError::DuplicateUser {
                field: "username",
                value: user.username.clone(),
            });
        }
        if UserId::next_after([&user.id]).is_none() {
            return Err(SeedError::SequenceExhausted {
                kind: "user",
                id: user.id.to_string(),
            });
        }
    }

    let mut tickets = Tickets::new();
    for entry in raw {
        let id = match entry.id.clone() {
            Some(id) => id,
            None => tickets.next_id().ok_or_else(|| SeedError::SequenceExhausted {
                kind: "ticket",
                id: "<generated>".to_string(),
            })?,
        };
        if tickets.contains(&id) {
            return Err(SeedError::DuplicateTicket { id });
        }
        if TicketId::next_after([&id]).is_none() {
            return Err(SeedError::SequenceExhausted {
                kind: "ticket",
                id: id.to_string(),
            });
        }
        let ticket = resolve_ticket(&users, id, entry, loaded_at)?;
        tickets = tickets.with_appended(ticket);
    }

    Ok(Seed { users, tickets })
}

fn resolve_ticket(
    users: &[User],
    id: TicketId,
    entry: SeedTicket,
    loaded_at: DateTime<Utc>,
) -> Result<Ticket, SeedError> {
    for (field, value) in [("title", &entry.title), ("description", &entry.description)] {
        if value.trim().is_empty() {
            return Err(SeedError::BlankField { ticket: id, field });
        }
    }
    if entry.completion_report.is_some()
        && !matches!(entry.status, Status::InProgress | Status::Resolved | Status::Closed)
    {
        return Err(SeedError::PrematureReport {
            ticket: id,
            status: entry.status,
        });
    }

    let requester = find_with_role(users, &id, &entry.requester, Role::User)?;
    let assignee = entry
        .assignee
        .as_deref()
        .map(|name| find_with_role(users, &id, name, Role::Technician))
        .transpose()?;

    match (entry.status.expects_assignee(), assignee.is_some()) {
        (true, false) => {
            return Err(SeedError::AssigneeMismatch {
                ticket: id,
                status: entry.status,
                problem: "has no assignee",
            });
        }
        (false, true) => {
            return Err(SeedError::AssigneeMismatch {
                ticket: id,
                status: entry.status,
                problem: "already has an assignee",
            });
        }
        _ => {}
    }

    Ok(Ticket {
        title: entry.title,
        description: entry.description,
        ticket_type: entry.ticket_type,
        status: entry.status,
        requester_id: requester.id.clone(),
        requester_name: requester.username.clone(),
        assignee_id: assignee.map(|u| u.id.clone()),
        assignee_name: assignee.map(|u| u.username.clone()),
        created_at: entry.created_at.unwrap_or(loaded_at),
        completion_report: entry.completion_report,
        id,
    })
}

fn find_with_role<'a>(
    users: &'a [User],
    ticket: &TicketId,
    username: &str,
    expected: Role,
) -> Result<&'a User, SeedError> {
    let user = users
        .iter()
        .find(|u| u.username == username)
        .ok_or_else(|| SeedError::UnknownUser {
            ticket: ticket.clone(),
            username: username.to_string(),
        })?;
    if user.role != expected {
        return Err(SeedError::WrongRole {
            ticket: ticket.clone(),
            username: username.to_string(),
            role: user.role,
            expected,
        });
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_seed(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).expect("write seed");
        path
    }

    #[test]
    fn builtin_seed_is_consistent() {
        let seed = builtin().expect("built-in seed validates");
        assert_eq!(seed.users.len(), 6);
        assert_eq!(seed.tickets.len(), 5);
        let statuses: Vec<_> = seed.tickets.iter().map(|t| t.status).collect();
        assert_eq!(statuses, Status::ALL.to_vec());
        for t in &seed.tickets {
            assert_eq!(t.status.expects_assignee(), t.assignee_id.is_some());
        }
        let first = seed.tickets.get(&TicketId::new("tk-1")).unwrap();
        assert_eq!(first.requester_id, UserId::new("1"));
    }

    #[test]
    fn loads_toml_seed_and_resolves_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_seed(
            &dir,
            "seed.toml",
            r#"
[[users]]
id = "u-1"
username = "alice"
role = "user"

[[users]]
id = "u-2"
username = "bob"
role = "technician"

[[tickets]]
title = "Printer broken"
description = "Paper jam"
type = "hardware"
requester = "alice"

[[tickets]]
id = "tk-10"
title = "VPN"
description = "Tunnel drops"
type = "network"
status = "in_progress"
requester = "alice"
assignee = "bob"
created_at = "2024-02-01T08:00:00Z"
"#,
        );

        let loaded_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let seed = load_seed(&path, loaded_at).expect("seed loads");
        let ids: Vec<_> = seed.tickets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["tk-1", "tk-10"]);

        let first = seed.tickets.get(&TicketId::new("tk-1")).unwrap();
        assert_eq!(first.status, Status::Created);
        assert_eq!(first.created_at, loaded_at);
        assert_eq!(first.requester_id, UserId::new("u-1"));

        let vpn = seed.tickets.get(&TicketId::new("tk-10")).unwrap();
        assert_eq!(vpn.assignee_name.as_deref(), Some("bob"));
        assert_eq!(
            vpn.created_at,
            Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn loads_json_seed_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_seed(
            &dir,
            "seed.json",
            r#"{"users":[{"id":"u-1","username":"alice","role":"user"}],
                "tickets":[{"title":"t","description":"d","requester":"alice"}]}"#,
        );
        let seed = load_seed(&path, Utc::now()).expect("json seed loads");
        assert_eq!(seed.tickets.len(), 1);
        assert_eq!(
            seed.tickets.iter().next().unwrap().ticket_type,
            TicketType::Software
        );
    }

    #[test]
    fn rejects_assignee_status_mismatch() {
        let users = vec![
            User::new("u-1", "alice", Role::User),
            User::new("u-2", "bob", Role::Technician),
        ];
        let raw = vec![
            SeedTicket::new("t", "d", TicketType::Software, "alice").worked_by("bob", Status::Created),
        ];
        assert!(matches!(
            build(users.clone(), raw, Utc::now()),
            Err(SeedError::AssigneeMismatch { .. })
        ));

        let mut unassigned = SeedTicket::new("t", "d", TicketType::Software, "alice");
        unassigned.status = Status::Resolved;
        assert!(matches!(
            build(users, vec![unassigned], Utc::now()),
            Err(SeedError::AssigneeMismatch {
                status: Status::Resolved,
                ..
            })
        ));
    }

    #[test]
    fn rejects_blank_title_or_description() {
        let users = vec![User::new("u-1", "alice", Role::User)];
        let untitled = SeedTicket::new("  ", "d", TicketType::Software, "alice");
        assert_eq!(
            build(users.clone(), vec![untitled], Utc::now()),
            Err(SeedError::BlankField {
                ticket: TicketId::new("tk-1"),
                field: "title"
            })
        );
        let undescribed = SeedTicket::new("t", "", TicketType::Software, "alice");
        assert!(matches!(
            build(users, vec![undescribed], Utc::now()),
            Err(SeedError::BlankField {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn rejects_report_before_work_starts() {
        let users = vec![
            User::new("u-1", "alice", Role::User),
            User::new("u-2", "bob", Role::Technician),
        ];
        let created = SeedTicket::new("t", "d", TicketType::Software, "alice").reported("done");
        assert!(matches!(
            build(users.clone(), vec![created], Utc::now()),
            Err(SeedError::PrematureReport {
                status: Status::Created,
                ..
            })
        ));
        let assigned = SeedTicket::new("t", "d", TicketType::Software, "alice")
            .worked_by("bob", Status::Assigned)
            .reported("done");
        assert!(matches!(
            build(users.clone(), vec![assigned], Utc::now()),
            Err(SeedError::PrematureReport {
                status: Status::Assigned,
                ..
            })
        ));
        let working = SeedTicket::new("t", "d", TicketType::Software, "alice")
            .worked_by("bob", Status::InProgress)
            .reported("halfway");
        assert!(build(users, vec![working], Utc::now()).is_ok());
    }

    #[test]
    fn rejects_ids_at_the_end_of_the_sequence() {
        let users = vec![User::new("u-1", "alice", Role::User)];
        let mut last = SeedTicket::new("t", "d", TicketType::Software, "alice");
        last.id = Some(TicketId::new("tk-18446744073709551615"));
        assert!(matches!(
            build(users, vec![last], Utc::now()),
            Err(SeedError::SequenceExhausted { kind: "ticket", .. })
        ));

        let users = vec![User::new("u-18446744073709551615", "alice", Role::User)];
        assert!(matches!(
            build(users, Vec::new(), Utc::now()),
            Err(SeedError::SequenceExhausted { kind: "user", .. })
        ));
    }

    #[test]
    fn rejects_wrong_roles_and_unknown_users() {
        let users = vec![
            User::new("u-1", "alice", Role::User),
            User::new("u-2", "admin", Role::Admin),
        ];
        let by_admin = SeedTicket::new("t", "d", TicketType::Software, "admin");
        assert!(matches!(
            build(users.clone(), vec![by_admin], Utc::now()),
            Err(SeedError::WrongRole {
                expected: Role::User,
                ..
            })
        ));
        let ghost = SeedTicket::new("t", "d", TicketType::Software, "ghost");
        assert!(matches!(
            build(users, vec![ghost], Utc::now()),
            Err(SeedError::UnknownUser { .. })
        ));
    }

    #[test]
    fn rejects_duplicates() {
        let users = vec![
            User::new("u-1", "alice", Role::User),
            User::new("u-1", "alice2", Role::User),
        ];
        assert!(matches!(
            build(users, Vec::new(), Utc::now()),
            Err(SeedError::DuplicateUser { field: "id", .. })
        ));

        let users = vec![User::new("u-1", "alice", Role::User)];
        let mut a = SeedTicket::new("a", "d", TicketType::Software, "alice");
        a.id = Some(TicketId::new("tk-1"));
        let mut b = a.clone();
        b.title = "b".to_string();
        assert_eq!(
            build(users, vec![a, b], Utc::now()),
            Err(SeedError::DuplicateTicket {
                id: TicketId::new("tk-1")
            })
        );
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_seed(&dir, "seed.toml", "[[users]]\nid='1'\nusername='a'\nrole='user'\nemail='x'\n");
        let err = load_seed(&path, Utc::now()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
