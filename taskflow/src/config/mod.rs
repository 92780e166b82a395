//! Configuration system for the TaskFlow client.
//!
//! Layered with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskflow/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

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

    /// The API base URL is not a valid URL.
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the TaskFlow backend.
    pub base_url: String,
    /// Bearer token, if the user is logged in.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Separated from `load()` to enable
    /// unit testing without CLI parsing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            base_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.base_url),
            token: cli.token.clone().or_else(|| file.api.token.clone()),
            timeout: file
                .api
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }

    /// Parses the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when it does not parse.
    pub fn parsed_base_url(&self) -> Result<url::Url, ConfigError> {
        Ok(url::Url::parse(&self.base_url)?)
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "TaskFlow API client")]
pub struct CliArgs {
    /// Base URL of the TaskFlow backend.
    #[arg(long, env = "TASKFLOW_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for authenticated requests.
    #[arg(long, env = "TASKFLOW_TOKEN")]
    pub token: Option<String>,

    /// Path to config file (default: `~/.config/taskflow/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKFLOW_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskflow.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot commands exercising the client stack.
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List tasks, optionally filtered.
    List {
        /// Only tasks with this status (todo, progress, review, done).
        #[arg(long)]
        status: Option<taskflow_proto::task::TaskStatus>,
        /// Only tasks with this priority (low, medium, high, urgent).
        #[arg(long)]
        priority: Option<taskflow_proto::task::TaskPriority>,
    },
    /// Create a task.
    Create {
        /// Task title.
        #[arg(long)]
        title: String,
        /// Priority (default: medium).
        #[arg(long, default_value = "medium")]
        priority: taskflow_proto::task::TaskPriority,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<chrono::NaiveDate>,
    },
    /// Mark a task completed.
    Complete {
        /// Id of the task.
        id: i64,
    },
    /// Delete a task.
    Delete {
        /// Id of the task.
        id: i64,
    },
    /// Join a team via its invite link.
    Join {
        /// Id of the team.
        team: i64,
        /// Placeholder team name from the invite link.
        #[arg(long)]
        name: Option<String>,
    },
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and a missing
/// file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskflow").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
