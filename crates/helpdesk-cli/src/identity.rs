//! Acting-user resolution for one-shot commands.
//!
//! The resolution chain: `--as` flag > `HELPDESK_USER` env > `user` in the
//! user config. Read commands that depend on visibility need an acting user;
//! `users`, `shell` and `run` work without one.

use std::env;

use crate::output::CliError;
use helpdesk_core::ErrorCode;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_user_with(
    cli_flag: Option<&str>,
    config_user: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(user) = cli_flag.map(str::trim).filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }

    if let Some(val) = env.get("HELPDESK_USER") {
        return Some(val.trim().to_string());
    }

    config_user
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Resolve the acting username, if any layer names one.
pub fn resolve_user(cli_flag: Option<&str>, config_user: Option<&str>) -> Option<String> {
    resolve_user_with(cli_flag, config_user, &RealEnv)
}

/// Resolve the acting username or explain how to set one.
pub fn require_user(cli_flag: Option<&str>, config_user: Option<&str>) -> Result<String, CliError> {
    resolve_user(cli_flag, config_user).ok_or_else(|| {
        CliError::with_details(
            "an acting user is required for this command",
            "pass --as <username>, set HELPDESK_USER, or set `user` in the user config",
            ErrorCode::NotAuthenticated.code(),
        )
    })
}
