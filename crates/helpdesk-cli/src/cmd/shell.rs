//! `hd shell` and `hd run`: a line-oriented session over the reducer.
//!
//! Every line is parsed into a session command, turned into an [`Intent`]
//! and applied to the current [`AppState`]. A rejected line is reported and
//! leaves the state untouched.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use helpdesk_core::{
    AppState, ErrorCode, Intent, NewTicket, SessionError, Status, StatusFilter, Ticket, TicketId,
    TicketType, User, UserId, View,
};
use serde::Serialize;
use tracing::{debug, info};

use super::{Reported, list, show, stats, users};
use crate::output::{CliError, OutputMode, render_error_to, render_mode_to, render_success_to};
use crate::validate::{self, ValidationError};

/// Arguments for `hd shell`.
#[derive(Args, Debug, Default)]
pub struct ShellArgs {}

/// Arguments for `hd run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Session script: one command per line, `#` starts a comment.
    pub file: PathBuf,

    /// Keep executing after a line fails.
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "session",
    no_binary_name = true,
    disable_version_flag = true,
    about = "Session commands"
)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Log in by username.
    Login { username: String },

    /// Register a new requester and log in.
    Register { username: String },

    /// Log out.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// File a ticket as the logged-in requester.
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// software, hardware or network.
        #[arg(long = "type", default_value = "software")]
        ticket_type: TicketType,
    },

    /// Assign a ticket to a technician (admin only).
    Assign { ticket: String, technician: String },

    /// Move a ticket to another status.
    Status { ticket: String, status: Status },

    /// Attach a completion report to a ticket in progress or resolved.
    Report {
        ticket: String,

        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Open a ticket.
    View { ticket: String },

    /// Return to the dashboard.
    Back,

    /// Set the dashboard status filter (a status or `all`).
    Filter { filter: StatusFilter },

    /// List tickets visible under the current filter.
    List,

    /// Per-status counts over visible tickets.
    Stats,

    /// List the user directory.
    Users,

    /// End the session.
    #[command(alias = "exit")]
    Quit,
}

/// Result of executing one line.
#[derive(Debug)]
pub enum Step {
    /// Blank line or comment.
    Skipped,
    Done,
    /// The line was rejected; the state is unchanged.
    Failed(CliError),
    Quit,
}

enum LineError {
    Rejected(CliError),
    Output(anyhow::Error),
}

impl From<SessionError> for LineError {
    fn from(err: SessionError) -> Self {
        Self::Rejected(CliError::from(&err))
    }
}

impl From<ValidationError> for LineError {
    fn from(err: ValidationError) -> Self {
        Self::Rejected(err.to_cli_error())
    }
}

impl From<anyhow::Error> for LineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Output(err)
    }
}

impl From<io::Error> for LineError {
    fn from(err: io::Error) -> Self {
        Self::Output(err.into())
    }
}

#[derive(Debug, Serialize)]
struct TicketNotice<'a> {
    ok: bool,
    message: &'a str,
    ticket: &'a Ticket,
}

#[derive(Debug, Serialize)]
struct WhoAmI<'a> {
    user: Option<&'a User>,
    view: View,
}

/// An interactive or scripted session.
pub struct Session {
    state: AppState,
    mode: OutputMode,
    quiet: bool,
}

impl Session {
    pub const fn new(state: AppState, mode: OutputMode, quiet: bool) -> Self {
        Self { state, mode, quiet }
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Execute one line, writing its output to `out`.
    ///
    /// # Errors
    ///
    /// Only output failures are errors; rejected lines come back as
    /// [`Step::Failed`].
    pub fn execute(&mut self, line: &str, out: &mut dyn Write) -> anyhow::Result<Step> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Step::Skipped);
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(err) => return Ok(Step::Failed(err)),
        };
        let parsed = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(err) => {
                return match err.kind() {
                    ErrorKind::DisplayHelp
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    | ErrorKind::DisplayVersion => {
                        write!(out, "{}", err.render())?;
                        Ok(Step::Done)
                    }
                    _ => Ok(Step::Failed(parse_error(&err))),
                };
            }
        };

        debug!(command = ?parsed.command, "session command");
        match self.dispatch(parsed.command, out) {
            Ok(step) => Ok(step),
            Err(LineError::Rejected(err)) => Ok(Step::Failed(err)),
            Err(LineError::Output(err)) => Err(err),
        }
    }

    fn apply(&mut self, intent: Intent) -> Result<(), SessionError> {
        self.state = self.state.reduce(intent)?;
        Ok(())
    }

    fn require_login(&self) -> Result<&User, SessionError> {
        self.state
            .current_user()
            .ok_or(SessionError::NotAuthenticated)
    }

    fn notice(&self, out: &mut dyn Write, message: &str) -> anyhow::Result<()> {
        if self.quiet {
            return Ok(());
        }
        render_success_to(out, self.mode, message)
    }

    fn ticket_notice(&self, out: &mut dyn Write, message: &str, id: &TicketId) -> anyhow::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let Some(ticket) = self.state.tickets().get(id) else {
            return render_success_to(out, self.mode, message);
        };
        let notice = TicketNotice {
            ok: true,
            message,
            ticket: ticket.as_ref(),
        };
        render_mode_to(
            out,
            self.mode,
            &notice,
            |n, w| writeln!(w, "ok  {}", n.message),
            |n, w| writeln!(w, "✓ {}", n.message),
        )
    }

    fn dispatch(&mut self, command: SessionCommand, out: &mut dyn Write) -> Result<Step, LineError> {
        match command {
            SessionCommand::Login { username } => {
                self.apply(Intent::Login { username })?;
                let user = self.require_login()?;
                let message = format!("logged in as {} ({})", user.username, user.role);
                self.notice(out, &message)?;
            }
            SessionCommand::Register { username } => {
                validate::validate_username(username.trim())?;
                self.apply(Intent::Register { username })?;
                let user = self.require_login()?;
                let message = format!("registered {} as {}", user.username, user.id);
                self.notice(out, &message)?;
            }
            SessionCommand::Logout => {
                self.apply(Intent::Logout)?;
                self.notice(out, "logged out")?;
            }
            SessionCommand::Whoami => {
                let who = WhoAmI {
                    user: self.state.current_user(),
                    view: self.state.view(),
                };
                render_mode_to(
                    out,
                    self.mode,
                    &who,
                    |who, w| match who.user {
                        Some(u) => writeln!(w, "{}\t{}\t{}", u.id, u.username, u.role),
                        None => writeln!(w, "-"),
                    },
                    |who, w| match who.user {
                        Some(u) => writeln!(w, "{} ({})", u.username, u.role.label()),
                        None => writeln!(w, "not logged in"),
                    },
                )?;
            }
            SessionCommand::Create {
                title,
                description,
                ticket_type,
            } => {
                validate::validate_title(&title)?;
                validate::validate_description(&description)?;
                self.apply(Intent::CreateTicket(NewTicket::new(
                    title,
                    description,
                    ticket_type,
                )))?;
                if let Some(created) = self.state.tickets().iter().last().map(|t| t.id.clone()) {
                    self.ticket_notice(out, &format!("created {created}"), &created)?;
                }
            }
            SessionCommand::Assign { ticket, technician } => {
                let ticket_id = TicketId::new(ticket.trim());
                let technician_id = self
                    .state
                    .find_user(technician.trim())
                    .map_or_else(|| UserId::new(technician.trim()), |u| u.id.clone());
                self.apply(Intent::AssignTechnician {
                    ticket_id: ticket_id.clone(),
                    technician_id,
                })?;
                let message = format!("assigned {ticket_id} to {}", technician.trim());
                self.ticket_notice(out, &message, &ticket_id)?;
            }
            SessionCommand::Status { ticket, status } => {
                let ticket_id = TicketId::new(ticket.trim());
                let from = self.state.tickets().get(&ticket_id).map(|t| t.status);
                self.apply(Intent::UpdateStatus {
                    ticket_id: ticket_id.clone(),
                    status,
                })?;
                let message = match from {
                    Some(from) => format!("{ticket_id}: {from} -> {status}"),
                    None => format!("{ticket_id}: {status}"),
                };
                self.ticket_notice(out, &message, &ticket_id)?;
            }
            SessionCommand::Report { ticket, text } => {
                let ticket_id = TicketId::new(ticket.trim());
                self.apply(Intent::SubmitReport {
                    ticket_id: ticket_id.clone(),
                    report: text.join(" "),
                })?;
                self.ticket_notice(out, &format!("report saved on {ticket_id}"), &ticket_id)?;
            }
            SessionCommand::View { ticket } => {
                self.apply(Intent::ViewTicket {
                    id: TicketId::new(ticket.trim()),
                })?;
                if let Some(selected) = self.state.selected() {
                    let moves = self.state.available_transitions(&selected);
                    show::write_ticket(out, self.mode, &selected, &moves)?;
                }
            }
            SessionCommand::Back => {
                self.apply(Intent::BackToDashboard)?;
                self.notice(out, "back to dashboard")?;
            }
            SessionCommand::Filter { filter } => {
                self.apply(Intent::SetFilter(filter))?;
                self.notice(out, &format!("filter set to {filter}"))?;
            }
            SessionCommand::List => {
                self.require_login()?;
                list::write_tickets(out, self.mode, &self.state.visible())?;
            }
            SessionCommand::Stats => {
                self.require_login()?;
                stats::write_stats(out, self.mode, &self.state.stats())?;
            }
            SessionCommand::Users => {
                let all: Vec<&User> = self.state.users().iter().collect();
                users::write_users(out, self.mode, &all)?;
            }
            SessionCommand::Quit => return Ok(Step::Quit),
        }
        Ok(Step::Done)
    }
}

fn parse_error(err: &clap::Error) -> CliError {
    let code = match err.kind() {
        ErrorKind::InvalidValue | ErrorKind::ValueValidation => ErrorCode::InvalidEnumValue,
        _ => ErrorCode::InvalidInput,
    };
    let rendered = err.to_string();
    let first = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    CliError::with_details(first, "type `help` for the list of commands", code.code())
}

/// Split a line into words. Single quotes are literal; inside double quotes
/// and bare words a backslash escapes the next character.
fn split_words(line: &str) -> Result<Vec<String>, CliError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(CliError::with_details(
            format!("unterminated {q} quote"),
            "close the quote or escape it with a backslash",
            ErrorCode::InvalidInput.code(),
        ));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// How [`run_lines`] treats failures and presentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Continue after a failing line.
    pub keep_going: bool,
    /// Prefix errors with their line number.
    pub numbered: bool,
    /// Print a prompt before reading each line.
    pub prompt: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
    pub quit: bool,
}

/// Feed `input` to `session` line by line.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub fn run_lines(
    session: &mut Session,
    input: impl BufRead,
    out: &mut dyn Write,
    err: &mut dyn Write,
    options: RunOptions,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut lines = input.lines();
    let mut line_no = 0usize;

    loop {
        if options.prompt {
            write!(out, "hd> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read session input")?;
        line_no += 1;

        match session.execute(&line, out)? {
            Step::Skipped => {}
            Step::Done => summary.executed += 1,
            Step::Failed(mut error) => {
                summary.failed += 1;
                if options.numbered {
                    error.message = format!("line {line_no}: {}", error.message);
                }
                render_error_to(err, session.mode(), &error)?;
                if !options.keep_going {
                    break;
                }
            }
            Step::Quit => {
                summary.quit = true;
                break;
            }
        }
    }

    info!(
        executed = summary.executed,
        failed = summary.failed,
        quit = summary.quit,
        logged_in = session.state().is_authenticated(),
        "session finished"
    );
    Ok(summary)
}

/// Execute `hd shell`: read session commands from stdin until EOF or `quit`.
pub fn run_shell(
    _args: &ShellArgs,
    state: AppState,
    mode: OutputMode,
    quiet: bool,
) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let prompt = stdin.is_terminal() && !mode.is_json();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let mut session = Session::new(state, mode, quiet);
    let options = RunOptions {
        keep_going: true,
        numbered: !prompt,
        prompt,
    };
    run_lines(&mut session, stdin.lock(), &mut out, &mut err, options)?;
    if prompt {
        writeln!(out)?;
    }
    Ok(())
}

/// Execute `hd run <file>`. Fails if any line failed.
pub fn run_script(
    args: &RunArgs,
    state: AppState,
    mode: OutputMode,
    quiet: bool,
) -> anyhow::Result<()> {
    let file = File::open(&args.file).map_err(|e| {
        super::report(
            mode,
            &CliError::with_details(
                format!("cannot open {}: {e}", args.file.display()),
                "check the script path",
                ErrorCode::InvalidInput.code(),
            ),
        )
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let mut session = Session::new(state, mode, quiet);
    let options = RunOptions {
        keep_going: args.keep_going,
        numbered: true,
        prompt: false,
    };
    let summary = run_lines(&mut session, BufReader::new(file), &mut out, &mut err, options)?;
    if summary.failed > 0 {
        return Err(Reported(format!("{} line(s) failed", summary.failed)).into());
    }
    Ok(())
}
