pub mod completions;
pub mod list;
pub mod shell;
pub mod show;
pub mod stats;
pub mod users;

use std::path::Path;

use chrono::Utc;
use helpdesk_core::config::{ProjectConfig, SeedSource};
use helpdesk_core::{AppState, ErrorCode, Intent, SessionError, seed};
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// An error that has already been shown to the user.
///
/// `main` exits non-zero on it without printing anything further.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Reported(pub String);

/// Render `error` to stderr and turn it into a [`Reported`].
pub fn report(mode: OutputMode, error: &CliError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, error) {
        return render_err;
    }
    Reported(error.message.clone()).into()
}

/// Build the logged-out session from the configured seed.
pub fn load_state(
    project: &ProjectConfig,
    project_root: &Path,
    cli_seed: Option<&Path>,
    mode: OutputMode,
) -> anyhow::Result<AppState> {
    let seed = match project.seed_source(project_root, cli_seed) {
        SeedSource::Builtin => seed::builtin().map_err(|err| {
            report(
                mode,
                &CliError::from_code(ErrorCode::SeedInvalid, format!("built-in seed: {err}")),
            )
        })?,
        SeedSource::File(path) => seed::load_seed(&path, Utc::now()).map_err(|err| {
            report(
                mode,
                &CliError::from_code(ErrorCode::SeedInvalid, format!("{err:#}")),
            )
        })?,
        SeedSource::Empty => seed::Seed {
            users: Vec::new(),
            tickets: helpdesk_core::Tickets::new(),
        },
    };
    debug!(
        users = seed.users.len(),
        tickets = seed.tickets.len(),
        "session seeded"
    );
    Ok(seed
        .into_state()
        .with_filter_defaults(project.session.filter_defaults()))
}

/// Log `username` in, reporting an unknown name as a rendered error.
pub fn login_as(state: &AppState, username: &str, mode: OutputMode) -> anyhow::Result<AppState> {
    state
        .reduce(Intent::Login {
            username: username.to_string(),
        })
        .map_err(|err| report(mode, &CliError::from(&err)))
}

/// Apply `intent`, reporting a rejection as a rendered error.
pub fn apply(state: &AppState, intent: Intent, mode: OutputMode) -> anyhow::Result<AppState> {
    state
        .reduce(intent)
        .map_err(|err: SessionError| report(mode, &CliError::from(&err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_seed_loads_with_project_filters() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut project = ProjectConfig::default();
        project.session.technician_filter = helpdesk_core::StatusFilter::All;

        let state = load_state(&project, root.path(), None, OutputMode::Text).expect("state");
        assert_eq!(state.users().len(), 6);

        let tech = login_as(&state, "tech1", OutputMode::Text).expect("login");
        assert_eq!(tech.filter(), helpdesk_core::StatusFilter::All);
    }

    #[test]
    fn disabled_builtin_yields_empty_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut project = ProjectConfig::default();
        project.seed.builtin = false;
        let state = load_state(&project, root.path(), None, OutputMode::Text).expect("state");
        assert!(state.users().is_empty());
        assert!(state.tickets().is_empty());
    }

    #[test]
    fn broken_seed_file_is_reported() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = root.path().join("seed.toml");
        std::fs::write(&path, "[[tickets]]\ntitle = 'x'\n").expect("write");
        let err = load_state(&ProjectConfig::default(), root.path(), Some(&path), OutputMode::Json)
            .unwrap_err();
        assert!(err.downcast_ref::<Reported>().is_some());
    }

    #[test]
    fn unknown_login_is_reported() {
        let state = seed::builtin().expect("builtin seed").into_state();
        let err = login_as(&state, "mallory", OutputMode::Text).unwrap_err();
        assert!(err.to_string().contains("mallory"));
    }
}
