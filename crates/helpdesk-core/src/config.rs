use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::model::{Status, StatusFilter};
use crate::session::FilterDefaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Where a session's mock data comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Seed file, relative to the project root.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub builtin: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            path: None,
            builtin: default_true(),
        }
    }
}

/// Dashboard filters applied on login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_technician_filter")]
    pub technician_filter: StatusFilter,
    #[serde(default)]
    pub admin_filter: StatusFilter,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            technician_filter: default_technician_filter(),
            admin_filter: StatusFilter::All,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn filter_defaults(&self) -> FilterDefaults {
        FilterDefaults {
            technician: self.technician_filter,
            admin: self.admin_filter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Default acting user for one-shot commands.
    #[serde(default)]
    pub user: Option<String>,
}

/// Where the seed for this invocation should be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    Builtin,
    File(PathBuf),
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

impl ProjectConfig {
    /// Resolve the seed source. An explicit `cli_seed` wins over the project
    /// setting; relative project paths are joined onto `project_root`.
    #[must_use]
    pub fn seed_source(&self, project_root: &Path, cli_seed: Option<&Path>) -> SeedSource {
        if let Some(path) = cli_seed {
            return SeedSource::File(path.to_path_buf());
        }
        match &self.seed.path {
            Some(path) if path.is_absolute() => SeedSource::File(path.clone()),
            Some(path) => SeedSource::File(project_root.join(path)),
            None if self.seed.builtin => SeedSource::Builtin,
            None => SeedSource::Empty,
        }
    }
}

/// Load `.helpdesk/config.toml` under `project_root`; missing means defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".helpdesk/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `helpdesk/config.toml` from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("helpdesk/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config layers and settle the output mode.
///
/// `cli_format` is the explicit `--format` value, if any.
///
/// # Errors
///
/// Returns an error if a config file is malformed or `cli_format` names an
/// unknown mode.
pub fn resolve_config(
    project_root: &Path,
    cli_format: Option<&str>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(
        cli_format,
        cli_json,
        user.output.as_deref(),
        env_format.as_deref(),
        std::io::stdout().is_terminal(),
    )?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Precedence: `--format`, `--json`, `FORMAT`, user config, then the TTY
/// default. Only an explicit `--format` must be valid; the ambient layers
/// fall through when unrecognised.
fn resolve_output(
    cli_format: Option<&str>,
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
    is_tty: bool,
) -> Result<String> {
    if let Some(raw) = cli_format {
        let Some(mode) = normalize_output_mode(raw) else {
            bail!("unknown output format '{raw}' (expected pretty, text or json)");
        };
        return Ok(mode.to_string());
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if is_tty {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_true() -> bool {
    true
}

const fn default_technician_filter() -> StatusFilter {
    StatusFilter::Only(Status::Assigned)
}
