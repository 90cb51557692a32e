//! `hd list`: tickets visible to the acting user.

use std::io::Write;
use std::sync::Arc;

use clap::Args;
use helpdesk_core::{AppState, Intent, StatusFilter, Ticket};

use crate::output::{OutputMode, pretty_section, render_mode_to};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Status filter: created, assigned, in_progress, resolved, closed or all.
    /// Defaults to the acting user's dashboard filter. Ignored for requesters.
    #[arg(short, long)]
    pub status: Option<StatusFilter>,
}

fn assignee(t: &Ticket) -> &str {
    t.assignee_name.as_deref().unwrap_or("-")
}

/// Write a ticket list as a table, TSV rows or a JSON array.
pub fn write_tickets(
    w: &mut dyn Write,
    mode: OutputMode,
    tickets: &[Arc<Ticket>],
) -> anyhow::Result<()> {
    let plain: Vec<&Ticket> = tickets.iter().map(|t| &**t).collect();
    render_mode_to(
        w,
        mode,
        &plain,
        |tickets, w| {
            for t in tickets {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    t.id,
                    t.status,
                    t.ticket_type,
                    t.requester_name,
                    assignee(t),
                    t.title
                )?;
            }
            Ok(())
        },
        |tickets, w| {
            pretty_section(w, &format!("Tickets ({})", tickets.len()))?;
            if tickets.is_empty() {
                writeln!(w, "No tickets.")?;
            }
            for t in tickets {
                writeln!(
                    w,
                    "{:<8} {:<12} {:<9} {:<12} {:<12} {}",
                    t.id.as_str(),
                    t.status.label(),
                    t.ticket_type.label(),
                    t.requester_name,
                    assignee(t),
                    t.title
                )?;
            }
            Ok(())
        },
    )
}

/// Execute `hd list` for an already logged-in session.
pub fn run_list(
    args: &ListArgs,
    state: &AppState,
    mode: OutputMode,
    w: &mut dyn Write,
) -> anyhow::Result<()> {
    let state = match args.status {
        Some(filter) => super::apply(state, Intent::SetFilter(filter), mode)?,
        None => state.clone(),
    };
    write_tickets(w, mode, &state.visible())
}
