#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod output;
mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use helpdesk_core::{AppState, ErrorCode};
use helpdesk_core::config::{EffectiveConfig, resolve_config};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hd: role-based helpdesk tickets",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for --format json).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Act as this user (falls back to HELPDESK_USER, then the user config).
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    acting: Option<String>,

    /// Seed file to start from instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    seed: Option<PathBuf>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode before any config is read, for reporting config errors.
    fn fallback_mode(&self) -> OutputMode {
        self.format
            .unwrap_or(if self.json { OutputMode::Json } else { OutputMode::Text })
    }

    fn acting_flag(&self) -> Option<&str> {
        self.acting.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "List the user directory",
        long_about = "List every known user with id and role. Needs no acting user.",
        after_help = "EXAMPLES:\n    # All users\n    hd users\n\n    # The assignment roster\n    hd users --technicians\n\n    # Emit machine-readable output\n    hd users --format json"
    )]
    Users(cmd::users::UsersArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets visible to the acting user",
        long_about = "List tickets visible to the acting user. Admins see all tickets, technicians their assignments, requesters their own tickets.",
        after_help = "EXAMPLES:\n    # Technician dashboard (assigned tickets by default)\n    hd --as tech1 list\n\n    # Everything a technician is working on\n    hd --as tech1 list --status all\n\n    # Emit machine-readable output\n    hd --as admin list --status in_progress --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket",
        long_about = "Show a ticket visible to the acting user, with the status moves available to them.",
        after_help = "EXAMPLES:\n    # Show a ticket\n    hd --as admin show tk-3\n\n    # Emit machine-readable output\n    hd --as bob show tk-3 --format json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Per-status ticket counts",
        long_about = "Count the acting user's visible tickets per status.",
        after_help = "EXAMPLES:\n    # Counts for an admin\n    hd --as admin stats\n\n    # Emit machine-readable output\n    hd --as alice stats --format json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Session",
        about = "Start an interactive session",
        long_about = "Read session commands from stdin, one per line, until EOF or `quit`. Type `help` for the command list.",
        after_help = "EXAMPLES:\n    # Interactive\n    hd shell\n\n    # Start logged in\n    hd --as admin shell\n\n    # Piped\n    printf 'login alice\\nlist\\n' | hd shell"
    )]
    Shell(cmd::shell::ShellArgs),

    #[command(
        next_help_heading = "Session",
        about = "Run a session script",
        long_about = "Execute a file of session commands. Stops at the first failing line unless --keep-going.",
        after_help = "EXAMPLES:\n    # Run a script\n    hd run demo.hd\n\n    # Report every failure\n    hd run demo.hd --keep-going"
    )]
    Run(cmd::shell::RunArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    hd completions bash\n\n    # Generate zsh completions\n    hd completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HELPDESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "helpdesk_core=debug,hd=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("HELPDESK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

/// Log the acting user in, or report that one is needed.
fn acting_state(
    cli: &Cli,
    config: &EffectiveConfig,
    state: &AppState,
    mode: OutputMode,
) -> anyhow::Result<AppState> {
    let username = identity::require_user(cli.acting_flag(), config.user.user.as_deref())
        .map_err(|err| cmd::report(mode, &err))?;
    cmd::login_as(state, &username, mode)
}

/// Sessions start logged in when an acting user resolves, logged out otherwise.
fn session_start(
    cli: &Cli,
    config: &EffectiveConfig,
    state: AppState,
    mode: OutputMode,
) -> anyhow::Result<AppState> {
    match identity::resolve_user(cli.acting_flag(), config.user.user.as_deref()) {
        Some(username) => cmd::login_as(&state, &username, mode),
        None => Ok(state),
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = resolve_config(
        &project_root,
        cli.format.map(OutputMode::as_str),
        cli.json,
    )
    .map_err(|err| {
        cmd::report(
            cli.fallback_mode(),
            &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
        )
    })?;
    let mode = OutputMode::from_name(&config.resolved_output);
    debug!(mode = mode.as_str(), "output mode resolved");

    let stdout = io::stdout();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        cmd::completions::run_completions(args.shell, &mut command, &mut stdout.lock());
        return Ok(());
    }

    let state = cmd::load_state(&config.project, &project_root, cli.seed.as_deref(), mode)?;

    match &cli.command {
        Commands::Users(args) => cmd::users::run_users(args, &state, mode, &mut stdout.lock()),
        Commands::List(args) => {
            let state = acting_state(cli, &config, &state, mode)?;
            cmd::list::run_list(args, &state, mode, &mut stdout.lock())
        }
        Commands::Show(args) => {
            let state = acting_state(cli, &config, &state, mode)?;
            cmd::show::run_show(args, &state, mode, &mut stdout.lock())
        }
        Commands::Stats(args) => {
            let state = acting_state(cli, &config, &state, mode)?;
            cmd::stats::run_stats(args, &state, mode, &mut stdout.lock())
        }
        Commands::Shell(args) => {
            let state = session_start(cli, &config, state, mode)?;
            cmd::shell::run_shell(args, state, mode, cli.quiet)
        }
        Commands::Run(args) => {
            let state = session_start(cli, &config, state, mode)?;
            cmd::shell::run_script(args, state, mode, cli.quiet)
        }
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.downcast_ref::<cmd::Reported>().is_none() {
                let error = CliError::from_code(ErrorCode::InternalUnexpected, format!("{err:#}"));
                if render_error(cli.fallback_mode(), &error).is_err() {
                    eprintln!("error: {err:#}");
                }
            }
            ExitCode::FAILURE
        }
    }
}
