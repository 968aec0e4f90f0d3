//! Configuration for the `teamboard` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/teamboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::highlight::HighlightTimings;
use crate::route::RouteFallbacks;
use crate::session::SessionConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    highlight: HighlightFileConfig,
    session: SessionFileConfig,
    routes: RoutesFileConfig,
    workspace: WorkspaceFileConfig,
}

/// `[highlight]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct HighlightFileConfig {
    timeout_ms: Option<u64>,
    task_flash_ms: Option<u64>,
    file_flash_delay_ms: Option<u64>,
    file_flash_hold_ms: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    channel_capacity: Option<usize>,
}

/// `[routes]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RoutesFileConfig {
    default_view: Option<String>,
    archive_view: Option<String>,
}

/// `[workspace]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct WorkspaceFileConfig {
    slug: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Highlight timeout and flash durations.
    pub highlight: HighlightTimings,
    /// Redirect targets for invalid routes.
    pub routes: RouteFallbacks,
    /// Capacity of the session command, event and notification channels.
    pub channel_capacity: usize,
    /// Workspace to bind before the first bootstrap arrives.
    pub workspace_slug: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            highlight: HighlightTimings::default(),
            routes: RouteFallbacks::default(),
            channel_capacity: 256,
            workspace_slug: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let ms = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_millis);

        Self {
            highlight: HighlightTimings {
                timeout: ms(file.highlight.timeout_ms, defaults.highlight.timeout),
                task_flash: ms(file.highlight.task_flash_ms, defaults.highlight.task_flash),
                file_flash_delay: ms(
                    file.highlight.file_flash_delay_ms,
                    defaults.highlight.file_flash_delay,
                ),
                file_flash_hold: ms(
                    file.highlight.file_flash_hold_ms,
                    defaults.highlight.file_flash_hold,
                ),
            },
            routes: RouteFallbacks {
                default_view: file
                    .routes
                    .default_view
                    .clone()
                    .unwrap_or(defaults.routes.default_view),
                archive_view: file
                    .routes
                    .archive_view
                    .clone()
                    .unwrap_or(defaults.routes.archive_view),
            },
            channel_capacity: file
                .session
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            workspace_slug: cli
                .workspace
                .clone()
                .or_else(|| file.workspace.slug.clone())
                .filter(|slug| !slug.is_empty()),
        }
    }

    /// Settings for [`spawn_session`](crate::session::spawn_session).
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            channel_capacity: self.channel_capacity,
            highlight: self.highlight,
            routes: self.routes.clone(),
            workspace_slug: self.workspace_slug.clone(),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task list reconciliation and session replay")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/teamboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace slug to bind before bootstrap.
    #[arg(long, env = "TEAMBOARD_WORKSPACE", global = true)]
    pub workspace: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TEAMBOARD_LOG", global = true)]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/teamboard.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands of the `teamboard` binary.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the diff between two JSON task lists.
    Diff {
        /// JSON file with the last-known server list.
        #[arg(long)]
        previous: PathBuf,
        /// JSON file with the edited list.
        #[arg(long)]
        next: PathBuf,
    },
    /// Run a JSON script of session steps against a recording remote.
    Replay {
        /// Path to the script.
        script: PathBuf,
    },
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist. Otherwise the default
/// path is tried and a missing file is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(path) = explicit_path {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("teamboard").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
