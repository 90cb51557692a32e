//! Role-gated status transition rules.
//!
//! | role       | allowed                                             |
//! |------------|-----------------------------------------------------|
//! | admin      | any status to any status                            |
//! | technician | `assigned -> in_progress`, `in_progress -> resolved` |
//! | user       | none                                                |
//!
//! Technicians are additionally limited to tickets assigned to them. The rule
//! table is checked before assignment, so a technician asking for a move the
//! table never allows gets [`EngineError::IllegalTransition`] regardless of
//! whose ticket it is.

use crate::error::EngineError;
use crate::model::{Role, Status, Ticket, User};

/// Whether `role` may ever move a ticket from `from` to `to`.
#[must_use]
pub fn role_allows(role: Role, from: Status, to: Status) -> bool {
    match role {
        Role::Admin => true,
        Role::Technician => matches!(
            (from, to),
            (Status::Assigned, Status::InProgress) | (Status::InProgress, Status::Resolved)
        ),
        Role::User => false,
    }
}

/// Validate that `actor` may move `ticket` to `to`.
///
/// # Errors
///
/// - [`EngineError::Unauthorized`] for users (no status rights at all), and
///   for technicians who are not the ticket's assignee.
/// - [`EngineError::IllegalTransition`] when a technician asks for a move
///   outside the rule table.
pub fn check_transition(actor: &User, ticket: &Ticket, to: Status) -> Result<(), EngineError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::User => Err(EngineError::Unauthorized {
            actor: actor.username.clone(),
            action: "change ticket status",
        }),
        Role::Technician => {
            if !role_allows(Role::Technician, ticket.status, to) {
                return Err(EngineError::IllegalTransition {
                    role: actor.role,
                    from: ticket.status,
                    to,
                });
            }
            if !ticket.is_assigned_to(actor) {
                return Err(EngineError::Unauthorized {
                    actor: actor.username.clone(),
                    action: "change the status of a ticket assigned to someone else",
                });
            }
            Ok(())
        }
    }
}

/// Statuses `actor` may move `ticket` to right now, in progression order.
///
/// Admins get every status (the admin view offers the full list, including
/// the current one). Technicians get their next step on their own tickets.
#[must_use]
pub fn available_transitions(actor: &User, ticket: &Ticket) -> Vec<Status> {
    Status::ALL
        .into_iter()
        .filter(|&to| check_transition(actor, ticket, to).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TicketId, TicketType, UserId};
    use chrono::Utc;

    fn tech(id: &str, name: &str) -> User {
        User::new(id, name, Role::Technician)
    }

    fn ticket(status: Status, assignee: Option<&User>) -> Ticket {
        Ticket {
            id: TicketId::new("tk-1"),
            title: "Printer broken".to_string(),
            description: "Paper jam".to_string(),
            ticket_type: TicketType::Hardware,
            status,
            requester_id: UserId::new("u-1"),
            requester_name: "alice".to_string(),
            assignee_id: assignee.map(|u| u.id.clone()),
            assignee_name: assignee.map(|u| u.username.clone()),
            created_at: Utc::now(),
            completion_report: None,
        }
    }

    #[test]
    fn technician_rule_table() {
        for from in Status::ALL {
            for to in Status::ALL {
                let expected = matches!(
                    (from, to),
                    (Status::Assigned, Status::InProgress) | (Status::InProgress, Status::Resolved)
                );
                assert_eq!(
                    role_allows(Role::Technician, from, to),
                    expected,
                    "{from} -> {to}"
                );
                assert!(role_allows(Role::Admin, from, to));
                assert!(!role_allows(Role::User, from, to));
            }
        }
    }

    #[test]
    fn illegal_move_reported_before_assignment_check() {
        let bob = tech("u-2", "bob");
        let t = ticket(Status::Created, None);
        assert!(matches!(
            check_transition(&bob, &t, Status::Resolved),
            Err(EngineError::IllegalTransition {
                role: Role::Technician,
                from: Status::Created,
                to: Status::Resolved,
            })
        ));
    }

    #[test]
    fn legal_move_by_non_assignee_is_unauthorized() {
        let bob = tech("u-2", "bob");
        let carol = tech("u-3", "carol");
        let t = ticket(Status::InProgress, Some(&bob));
        assert!(check_transition(&bob, &t, Status::Resolved).is_ok());
        assert!(matches!(
            check_transition(&carol, &t, Status::Resolved),
            Err(EngineError::Unauthorized { .. })
        ));
    }

    #[test]
    fn requester_has_no_status_rights() {
        let alice = User::new("u-1", "alice", Role::User);
        let t = ticket(Status::Resolved, None);
        assert!(matches!(
            check_transition(&alice, &t, Status::Closed),
            Err(EngineError::Unauthorized { .. })
        ));
    }

    #[test]
    fn available_transitions_per_role() {
        let bob = tech("u-2", "bob");
        let admin = User::new("u-9", "admin", Role::Admin);

        let assigned = ticket(Status::Assigned, Some(&bob));
        assert_eq!(available_transitions(&bob, &assigned), vec![Status::InProgress]);
        assert_eq!(available_transitions(&admin, &assigned), Status::ALL.to_vec());

        let resolved = ticket(Status::Resolved, Some(&bob));
        assert!(available_transitions(&bob, &resolved).is_empty());

        let someone_else = tech("u-3", "carol");
        assert!(available_transitions(&someone_else, &assigned).is_empty());
    }
}
