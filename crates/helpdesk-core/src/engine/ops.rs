//! Ticket mutations.
//!
//! Every operation takes the current collection by reference and returns a
//! new one. The input is never modified, and tickets other than the target
//! keep their `Arc` identity in the result.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::transition::check_transition;
use crate::error::EngineError;
use crate::model::{NewTicket, Role, Status, Ticket, TicketId, Tickets, User};

fn require_non_blank(field: &'static str, value: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn find<'a>(tickets: &'a Tickets, id: &TicketId) -> Result<&'a Ticket, EngineError> {
    tickets
        .get(id)
        .map(|t| &**t)
        .ok_or_else(|| EngineError::TicketNotFound { id: id.clone() })
}

fn replace(tickets: &Tickets, updated: Ticket) -> Result<Tickets, EngineError> {
    let id = updated.id.clone();
    tickets
        .with_replaced(&id, updated)
        .ok_or(EngineError::TicketNotFound { id })
}

/// File a new ticket on behalf of `requester`, stamped with `now`.
///
/// # Errors
///
/// - [`EngineError::Unauthorized`] unless `requester` has the `user` role.
/// - [`EngineError::InvalidInput`] if the title or description is blank, or
///   when no `tk-<n>` id is left to hand out.
pub fn create_ticket(
    tickets: &Tickets,
    requester: &User,
    draft: NewTicket,
    now: DateTime<Utc>,
) -> Result<Tickets, EngineError> {
    if requester.role != Role::User {
        return Err(EngineError::Unauthorized {
            actor: requester.username.clone(),
            action: "file tickets",
        });
    }
    require_non_blank("title", &draft.title)?;
    require_non_blank("description", &draft.description)?;
    let id = tickets
        .next_id()
        .ok_or_else(|| EngineError::invalid("id", "ticket id sequence is exhausted"))?;

    let ticket = Ticket {
        id,
        title: draft.title,
        description: draft.description,
        ticket_type: draft.ticket_type,
        status: Status::Created,
        requester_id: requester.id.clone(),
        requester_name: requester.username.clone(),
        assignee_id: None,
        assignee_name: None,
        created_at: now,
        completion_report: None,
    };
    info!(ticket = %ticket.id, requester = %requester.username, "ticket created");
    Ok(tickets.with_appended(ticket))
}

/// [`create_ticket`] stamped with the current wall-clock time.
///
/// # Errors
///
/// See [`create_ticket`].
pub fn create_ticket_now(
    tickets: &Tickets,
    requester: &User,
    draft: NewTicket,
) -> Result<Tickets, EngineError> {
    create_ticket(tickets, requester, draft, Utc::now())
}

/// Assign `technician` to a ticket and force its status to `assigned`.
///
/// The status is reset even when the ticket was already resolved or closed.
///
/// # Errors
///
/// - [`EngineError::Unauthorized`] unless `actor` is an admin.
/// - [`EngineError::InvalidInput`] if `technician` lacks the technician role.
/// - [`EngineError::TicketNotFound`] if no ticket has `ticket_id`.
pub fn assign(
    tickets: &Tickets,
    ticket_id: &TicketId,
    actor: &User,
    technician: &User,
) -> Result<Tickets, EngineError> {
    if !actor.is_admin() {
        return Err(EngineError::Unauthorized {
            actor: actor.username.clone(),
            action: "assign tickets",
        });
    }
    if !technician.is_technician() {
        return Err(EngineError::invalid(
            "technician",
            format!("'{}' is a {}, not a technician", technician.username, technician.role),
        ));
    }

    let current = find(tickets, ticket_id)?;
    if matches!(current.status, Status::Resolved | Status::Closed) {
        warn!(
            ticket = %ticket_id,
            from = %current.status,
            "reassigning a finished ticket resets it to assigned"
        );
    }

    let mut updated = current.clone();
    updated.assignee_id = Some(technician.id.clone());
    updated.assignee_name = Some(technician.username.clone());
    updated.status = Status::Assigned;

    info!(ticket = %ticket_id, technician = %technician.username, "ticket assigned");
    replace(tickets, updated)
}

/// Move a ticket to `to` on behalf of `actor`.
///
/// An admin setting the status a ticket already has is accepted and returns
/// an identical collection.
///
/// # Errors
///
/// - [`EngineError::TicketNotFound`] if no ticket has `ticket_id`.
/// - [`EngineError::IllegalTransition`] / [`EngineError::Unauthorized`] per
///   [`check_transition`].
pub fn set_status(
    tickets: &Tickets,
    ticket_id: &TicketId,
    actor: &User,
    to: Status,
) -> Result<Tickets, EngineError> {
    let current = find(tickets, ticket_id)?;
    check_transition(actor, current, to)?;

    if current.status == to {
        return Ok(tickets.clone());
    }
    if actor.is_admin() && to.expects_assignee() && current.assignee_id.is_none() {
        warn!(ticket = %ticket_id, to = %to, "admin moved an unassigned ticket past created");
    }

    let from = current.status;
    let mut updated = current.clone();
    updated.status = to;

    info!(ticket = %ticket_id, actor = %actor.username, %from, %to, "status changed");
    replace(tickets, updated)
}

/// Attach a completion report to a ticket that is being or has been worked.
///
/// # Errors
///
/// - [`EngineError::InvalidInput`] for a blank report, or when the ticket is
///   not `in_progress` or `resolved`.
/// - [`EngineError::Unauthorized`] unless `actor` is an admin or the assignee.
/// - [`EngineError::TicketNotFound`] if no ticket has `ticket_id`.
pub fn submit_report(
    tickets: &Tickets,
    ticket_id: &TicketId,
    actor: &User,
    report: &str,
) -> Result<Tickets, EngineError> {
    require_non_blank("report", report)?;
    let current = find(tickets, ticket_id)?;

    let permitted = match actor.role {
        Role::Admin => true,
        Role::Technician => current.is_assigned_to(actor),
        Role::User => false,
    };
    if !permitted {
        return Err(EngineError::Unauthorized {
            actor: actor.username.clone(),
            action: "report on this ticket",
        });
    }
    if !matches!(current.status, Status::InProgress | Status::Resolved) {
        return Err(EngineError::invalid(
            "status",
            format!(
                "a report needs an in_progress or resolved ticket, '{}' is {}",
                ticket_id, current.status
            ),
        ));
    }

    let mut updated = current.clone();
    updated.completion_report = Some(report.trim().to_string());

    info!(ticket = %ticket_id, actor = %actor.username, "completion report submitted");
    replace(tickets, updated)
}
