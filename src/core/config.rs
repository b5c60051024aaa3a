//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.justdoit/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//! Every location is resolved here and handed to the workspace explicitly;
//! nothing below this module reads the home directory on its own.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JustdoitConfig {
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub todo_dir: Option<String>,
    pub default_list: Option<String>,
    pub log_level: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TODO_DIR: &str = "~/.tui_todos";
pub const DEFAULT_LIST: &str = "default";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;
pub const ARCHIVE_DIR_NAME: &str = "archive";
pub const CONFIG_DIR_NAME: &str = ".justdoit";
pub const LOG_FILE_NAME: &str = "justdoit.log";

pub const ENV_TODO_DIR: &str = "JUSTDOIT_DIR";
pub const ENV_LIST: &str = "JUSTDOIT_LIST";
pub const ENV_LOG_LEVEL: &str = "JUSTDOIT_LOG";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub todo_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub default_list: String,
    pub log_level: LevelFilter,
}

/// Values given on the command line. `None` = flag not passed.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub todo_dir: Option<PathBuf>,
    pub list: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("config parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.justdoit`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME))
}

/// Returns the path to `~/.justdoit/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Returns the log file that sits next to `config_path`
/// (`~/.justdoit/justdoit.log` by default). A bare file name logs to `.`.
pub fn log_file_path(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(LOG_FILE_NAME),
        _ => PathBuf::from(".").join(LOG_FILE_NAME),
    }
}

/// Load config from `path`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `JustdoitConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config(path: &Path) -> Result<JustdoitConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(JustdoitConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: JustdoitConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# justdoit configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# todo_dir = "~/.tui_todos"     # Or set JUSTDOIT_DIR; archived lists go to <todo_dir>/archive
# default_list = "default"      # Or set JUSTDOIT_LIST; used when --list is omitted
# log_level = "info"            # Or set JUSTDOIT_LOG; "off", "error", "warn", "info", "debug", "trace"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config from the process environment.
pub fn resolve(config: &JustdoitConfig, overrides: &Overrides) -> ResolvedConfig {
    resolve_with(config, overrides, |key| std::env::var(key).ok())
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `env` looks up an environment variable; tests pass a closure over a map.
pub fn resolve_with<E>(config: &JustdoitConfig, overrides: &Overrides, env: E) -> ResolvedConfig
where
    E: Fn(&str) -> Option<String>,
{
    // Todo dir: CLI → env → config → default
    let todo_dir = overrides.todo_dir.clone().unwrap_or_else(|| {
        let raw = env(ENV_TODO_DIR)
            .or_else(|| config.general.todo_dir.clone())
            .unwrap_or_else(|| DEFAULT_TODO_DIR.to_string());
        expand_home(&raw)
    });
    let archive_dir = todo_dir.join(ARCHIVE_DIR_NAME);

    // Default list: CLI → env → config → default
    let default_list = overrides
        .list
        .clone()
        .or_else(|| env(ENV_LIST))
        .or_else(|| config.general.default_list.clone())
        .unwrap_or_else(|| DEFAULT_LIST.to_string());

    // Log level: env → config → default
    let log_level = env(ENV_LOG_LEVEL)
        .or_else(|| config.general.log_level.clone())
        .map(|raw| parse_level(&raw))
        .unwrap_or(DEFAULT_LOG_LEVEL);

    ResolvedConfig {
        todo_dir,
        archive_dir,
        default_list,
        log_level,
    }
}

/// Level used while the config file is still being read: `JUSTDOIT_LOG`,
/// else the default. [`resolve`] decides the level for the rest of the run.
pub fn startup_log_level() -> LevelFilter {
    startup_log_level_with(|key| std::env::var(key).ok())
}

pub fn startup_log_level_with<E>(env: E) -> LevelFilter
where
    E: Fn(&str) -> Option<String>,
{
    env(ENV_LOG_LEVEL)
        .map(|raw| parse_level(&raw))
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

fn parse_level(raw: &str) -> LevelFilter {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Unknown log level {:?}, using {}", raw, DEFAULT_LOG_LEVEL);
        DEFAULT_LOG_LEVEL
    })
}

/// Expands a leading `~` to the home directory. Other paths pass through.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}
