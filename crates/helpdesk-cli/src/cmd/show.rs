//! `hd show`: one ticket with the moves available to the acting user.

use std::io::Write;

use clap::Args;
use helpdesk_core::{AppState, Intent, Status, Ticket, TicketId};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode_to};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket ID (e.g. tk-3).
    pub id: String,
}

#[derive(Debug, Serialize)]
struct TicketDetail<'a> {
    ticket: &'a Ticket,
    available_transitions: &'a [Status],
}

/// Write one ticket and its available transitions.
pub fn write_ticket(
    w: &mut dyn Write,
    mode: OutputMode,
    ticket: &Ticket,
    transitions: &[Status],
) -> anyhow::Result<()> {
    let detail = TicketDetail {
        ticket,
        available_transitions: transitions,
    };
    let moves = transitions
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",");

    render_mode_to(
        w,
        mode,
        &detail,
        |d, w| {
            let t = d.ticket;
            writeln!(w, "id\t{}", t.id)?;
            writeln!(w, "title\t{}", t.title)?;
            writeln!(w, "type\t{}", t.ticket_type)?;
            writeln!(w, "status\t{}", t.status)?;
            writeln!(w, "requester\t{}", t.requester_name)?;
            writeln!(w, "assignee\t{}", t.assignee_name.as_deref().unwrap_or("-"))?;
            writeln!(w, "created\t{}", t.created_at.to_rfc3339())?;
            writeln!(w, "description\t{}", t.description.replace('\n', " "))?;
            if let Some(report) = &t.completion_report {
                writeln!(w, "report\t{}", report.replace('\n', " "))?;
            }
            writeln!(w, "transitions\t{moves}")
        },
        |d, w| {
            let t = d.ticket;
            pretty_section(w, &format!("{}  {}", t.id, t.title))?;
            pretty_kv(w, "Status", t.status.label())?;
            pretty_kv(w, "Type", t.ticket_type.label())?;
            pretty_kv(w, "Requester", &t.requester_name)?;
            pretty_kv(w, "Assignee", t.assignee_name.as_deref().unwrap_or("unassigned"))?;
            pretty_kv(w, "Created", t.created_at.format("%Y-%m-%d %H:%M UTC").to_string())?;
            writeln!(w)?;
            writeln!(w, "{}", t.description)?;
            if let Some(report) = &t.completion_report {
                writeln!(w)?;
                pretty_kv(w, "Report", report)?;
            }
            if !d.available_transitions.is_empty() {
                writeln!(w)?;
                let labels: Vec<_> = d.available_transitions.iter().map(|s| s.label()).collect();
                pretty_kv(w, "Can move to", labels.join(", "))?;
            }
            Ok(())
        },
    )
}

/// Execute `hd show` for an already logged-in session.
pub fn run_show(
    args: &ShowArgs,
    state: &AppState,
    mode: OutputMode,
    w: &mut dyn Write,
) -> anyhow::Result<()> {
    let opened = super::apply(
        state,
        Intent::ViewTicket {
            id: TicketId::new(args.id.trim()),
        },
        mode,
    )?;
    let Some(ticket) = opened.selected() else {
        anyhow::bail!("ticket {} vanished after selection", args.id);
    };
    write_ticket(w, mode, &ticket, &opened.available_transitions(&ticket))
}
