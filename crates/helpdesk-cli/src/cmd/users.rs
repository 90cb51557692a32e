//! `hd users`: list the user directory.

use std::io::Write;

use clap::Args;
use helpdesk_core::{AppState, User};

use crate::output::{OutputMode, pretty_section, render_mode_to};

/// Arguments for `hd users`.
#[derive(Args, Debug, Default)]
pub struct UsersArgs {
    /// Only list technicians (the assignment roster).
    #[arg(long)]
    pub technicians: bool,
}

/// Write `users` as a table, TSV rows or a JSON array.
pub fn write_users(w: &mut dyn Write, mode: OutputMode, users: &[&User]) -> anyhow::Result<()> {
    render_mode_to(
        w,
        mode,
        users,
        |users, w| {
            for u in users {
                writeln!(w, "{}\t{}\t{}", u.id, u.username, u.role)?;
            }
            Ok(())
        },
        |users, w| {
            pretty_section(w, &format!("Users ({})", users.len()))?;
            for u in users {
                writeln!(w, "{:<8} {:<16} {}", u.id.as_str(), u.username, u.role.label())?;
            }
            Ok(())
        },
    )
}

/// Execute `hd users`.
pub fn run_users(
    args: &UsersArgs,
    state: &AppState,
    mode: OutputMode,
    w: &mut dyn Write,
) -> anyhow::Result<()> {
    let users: Vec<&User> = if args.technicians {
        state.technicians()
    } else {
        state.users().iter().collect()
    };
    write_users(w, mode, &users)
}
