//! `hd stats`: per-status counts over the acting user's tickets.

use std::io::Write;

use clap::Args;
use helpdesk_core::{AppState, Status, TicketStats};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode_to};

/// Arguments for `hd stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

pub fn write_stats(w: &mut dyn Write, mode: OutputMode, stats: &TicketStats) -> anyhow::Result<()> {
    render_mode_to(
        w,
        mode,
        stats,
        |s, w| {
            writeln!(w, "total\t{}", s.total)?;
            for status in Status::ALL {
                writeln!(w, "{status}\t{}", s.count(status))?;
            }
            Ok(())
        },
        |s, w| {
            pretty_section(w, "Ticket statistics")?;
            pretty_kv(w, "Total", s.total.to_string())?;
            pretty_kv(w, "Open", s.open().to_string())?;
            for status in Status::ALL {
                pretty_kv(w, status.label(), s.count(status).to_string())?;
            }
            Ok(())
        },
    )
}

/// Execute `hd stats` for an already logged-in session.
pub fn run_stats(
    _args: &StatsArgs,
    state: &AppState,
    mode: OutputMode,
    w: &mut dyn Write,
) -> anyhow::Result<()> {
    write_stats(w, mode, &state.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::seed;

    #[test]
    fn counts_follow_visibility() {
        let state = seed::builtin().expect("builtin seed").into_state();
        let bob = super::super::login_as(&state, "bob", OutputMode::Text).expect("login");
        let mut buf = Vec::new();
        run_stats(&StatsArgs::default(), &bob, OutputMode::Json, &mut buf).expect("stats");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["total"], 2);
        assert_eq!(value["in_progress"], 1);
        assert_eq!(value["closed"], 1);
    }

    #[test]
    fn text_lists_every_status() {
        let mut buf = Vec::new();
        write_stats(&mut buf, OutputMode::Text, &TicketStats::default()).expect("stats");
        let out = String::from_utf8(buf).expect("utf8");
        assert_eq!(out.lines().count(), 1 + Status::ALL.len());
        assert!(out.contains("in_progress\t0"));
    }
}
