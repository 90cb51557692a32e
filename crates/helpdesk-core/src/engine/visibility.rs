//! Which tickets each role may see.

use std::sync::Arc;

use crate::model::{Role, StatusFilter, Ticket, Tickets, User};

/// Whether `user` may see `ticket` at all, ignoring any status filter.
#[must_use]
pub fn can_see(user: &User, ticket: &Ticket) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Technician => ticket.is_assigned_to(user),
        Role::User => ticket.is_requested_by(user),
    }
}

/// Tickets visible to `user`, in creation order.
///
/// Admins see everything and technicians see their assignments, both narrowed
/// by `filter`. Requesters see their own tickets; `filter` does not apply to
/// them.
#[must_use]
pub fn visible_tickets(tickets: &Tickets, user: &User, filter: StatusFilter) -> Vec<Arc<Ticket>> {
    let filter = match user.role {
        Role::Admin | Role::Technician => filter,
        Role::User => StatusFilter::All,
    };
    tickets
        .iter()
        .filter(|t| can_see(user, t) && filter.matches(t.status))
        .cloned()
        .collect()
}

/// Technicians in `users`, in directory order. This is the assignment roster.
pub fn technicians<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<&'a User> {
    users.into_iter().filter(|u| u.is_technician()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, TicketId, TicketType, UserId};
    use chrono::Utc;

    fn ticket(id: &str, status: Status, requester: &str, assignee: Option<&str>) -> Ticket {
        Ticket {
            id: TicketId::new(id),
            title: id.to_string(),
            description: "d".to_string(),
            ticket_type: TicketType::Network,
            status,
            requester_id: UserId::new(requester),
            requester_name: requester.to_string(),
            assignee_id: assignee.map(UserId::new),
            assignee_name: assignee.map(str::to_string),
            created_at: Utc::now(),
            completion_report: None,
        }
    }

    fn fixture() -> Tickets {
        [
            ticket("tk-1", Status::Created, "u-1", None),
            ticket("tk-2", Status::Assigned, "u-1", Some("u-3")),
            ticket("tk-3", Status::InProgress, "u-2", Some("u-3")),
            ticket("tk-4", Status::Assigned, "u-2", Some("u-4")),
            ticket("tk-5", Status::Resolved, "u-1", Some("u-3")),
        ]
        .into_iter()
        .collect()
    }

    fn ids(tickets: &[Arc<Ticket>]) -> Vec<&str> {
        tickets.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn admin_sees_all_with_filter() {
        let admin = User::new("u-9", "admin", Role::Admin);
        let tickets = fixture();
        assert_eq!(
            ids(&visible_tickets(&tickets, &admin, StatusFilter::All)),
            ["tk-1", "tk-2", "tk-3", "tk-4", "tk-5"]
        );
        assert_eq!(
            ids(&visible_tickets(
                &tickets,
                &admin,
                StatusFilter::Only(Status::Assigned)
            )),
            ["tk-2", "tk-4"]
        );
    }

    #[test]
    fn technician_sees_own_assignments() {
        let bob = User::new("u-3", "bob", Role::Technician);
        let tickets = fixture();
        assert_eq!(
            ids(&visible_tickets(&tickets, &bob, StatusFilter::All)),
            ["tk-2", "tk-3", "tk-5"]
        );
        assert_eq!(
            ids(&visible_tickets(
                &tickets,
                &bob,
                StatusFilter::default_for(Role::Technician)
            )),
            ["tk-2"]
        );
    }

    #[test]
    fn requester_ignores_filter() {
        let alice = User::new("u-1", "alice", Role::User);
        let tickets = fixture();
        let expected = ["tk-1", "tk-2", "tk-5"];
        assert_eq!(ids(&visible_tickets(&tickets, &alice, StatusFilter::All)), expected);
        assert_eq!(
            ids(&visible_tickets(
                &tickets,
                &alice,
                StatusFilter::Only(Status::Closed)
            )),
            expected
        );
    }

    #[test]
    fn visible_shares_ticket_identity() {
        let admin = User::new("u-9", "admin", Role::Admin);
        let tickets = fixture();
        let seen = visible_tickets(&tickets, &admin, StatusFilter::All);
        for (shown, stored) in seen.iter().zip(tickets.iter()) {
            assert!(Arc::ptr_eq(shown, stored));
        }
    }

    #[test]
    fn roster_keeps_only_technicians() {
        let users = [
            User::new("1", "user1", Role::User),
            User::new("3", "tech1", Role::Technician),
            User::new("2", "admin", Role::Admin),
            User::new("4", "tech2", Role::Technician),
        ];
        let names: Vec<_> = technicians(&users).iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["tech1", "tech2"]);
    }
}
