//! Daemon settings
//!
//! JSON file under the XDG config dir, every field optional. Env vars
//! override file values, then everything is clamped to sane ranges.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{backup, config, monitor, paths, restart};
use crate::monitor::MonitorOptions;

/// Which file monitor implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    /// Event-driven when the platform supports it, polling otherwise
    #[default]
    Auto,
    Events,
    Polling,
}

impl std::str::FromStr for StrategyPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "events" | "event" | "notify" => Ok(Self::Events),
            "polling" | "poll" => Ok(Self::Polling),
            other => anyhow::bail!("unknown monitor strategy '{other}' (expected auto, events or polling)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Colorscheme file written by the generator
    #[serde(default = "default_colors_file")]
    pub colors_file: PathBuf,

    /// Directory for timestamped snapshots
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Last known good palette
    #[serde(default = "default_last_good_file")]
    pub last_good_file: PathBuf,

    /// Sentinel touched after every applied palette
    #[serde(default = "default_restart_trigger_file")]
    pub restart_trigger_file: PathBuf,

    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    #[serde(default)]
    pub strategy: StrategyPreference,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Run by `watch` when the sentinel appears
    #[serde(default = "default_restart_command")]
    pub restart_command: String,
}

fn cache_path(relative: &str) -> PathBuf {
    dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")).join(relative)
}

fn config_dir_path(relative: &str) -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(relative)
}

fn default_colors_file() -> PathBuf {
    cache_path(paths::COLORS_FILE)
}

fn default_backup_dir() -> PathBuf {
    cache_path(paths::BACKUP_DIR)
}

fn default_last_good_file() -> PathBuf {
    cache_path(paths::LAST_GOOD_FILE)
}

fn default_restart_trigger_file() -> PathBuf {
    config_dir_path(paths::RESTART_TRIGGER_FILE)
}

fn default_max_backups() -> usize {
    backup::MAX_BACKUPS
}

fn default_settle_delay_ms() -> u64 {
    monitor::SETTLE_DELAY_MS
}

fn default_poll_interval_ms() -> u64 {
    monitor::POLL_INTERVAL_MS
}

fn default_poll_max_interval_ms() -> u64 {
    monitor::POLL_MAX_INTERVAL_MS
}

fn default_max_consecutive_errors() -> u32 {
    monitor::MAX_CONSECUTIVE_ERRORS
}

fn default_stop_timeout_ms() -> u64 {
    monitor::STOP_TIMEOUT_MS
}

fn default_restart_command() -> String {
    restart::DEFAULT_COMMAND.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            colors_file: default_colors_file(),
            backup_dir: default_backup_dir(),
            last_good_file: default_last_good_file(),
            restart_trigger_file: default_restart_trigger_file(),
            max_backups: default_max_backups(),
            strategy: StrategyPreference::default(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            max_consecutive_errors: default_max_consecutive_errors(),
            stop_timeout_ms: default_stop_timeout_ms(),
            restart_command: default_restart_command(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from `path` (or the default location), then apply env overrides.
    /// A missing file yields defaults; a broken one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let mut settings = match fs::read_to_string(&config_path) {
            Ok(contents) => {
                let settings = Self::from_json(&contents)
                    .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
                info!(path = %config_path.display(), "Loaded settings");
                settings
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %config_path.display(), "No config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file {}", config_path.display()));
            }
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.validate_and_clamp();
        Ok(settings)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Invalid settings JSON")
    }

    /// Default settings with every file kept under `root`
    #[cfg(test)]
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            colors_file: root.join("colors.json"),
            backup_dir: root.join("backups"),
            last_good_file: root.join("last_good_colors.json"),
            restart_trigger_file: root.join("restart_trigger"),
            ..Self::default()
        }
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(config::ENV_COLORS_FILE) {
            info!(colors_file = %path, "Colors file overridden from environment");
            self.colors_file = PathBuf::from(path);
        }
        if let Some(path) = lookup(config::ENV_BACKUP_DIR) {
            info!(backup_dir = %path, "Backup directory overridden from environment");
            self.backup_dir = PathBuf::from(path);
            // Last good lives beside the backup directory
            let parent = self.backup_dir.parent().unwrap_or(&self.backup_dir);
            self.last_good_file = parent.join(paths::LAST_GOOD_NAME);
        }
        if let Some(path) = lookup(config::ENV_TRIGGER_FILE) {
            info!(restart_trigger_file = %path, "Restart trigger overridden from environment");
            self.restart_trigger_file = PathBuf::from(path);
        }
        if let Some(value) = lookup(config::ENV_STRATEGY) {
            match value.parse() {
                Ok(strategy) => self.strategy = strategy,
                Err(e) => warn!(error = %e, "Ignoring invalid {}", config::ENV_STRATEGY),
            }
        }
    }

    /// Clamp values to ranges the monitor can live with
    fn validate_and_clamp(&mut self) {
        if self.max_backups == 0 {
            warn!(using = backup::MAX_BACKUPS, "max_backups must be at least 1, using default");
            self.max_backups = backup::MAX_BACKUPS;
        }

        if self.poll_interval_ms == 0 {
            warn!(using = monitor::POLL_INTERVAL_MS, "poll_interval_ms must be non-zero, using default");
            self.poll_interval_ms = monitor::POLL_INTERVAL_MS;
        }

        if self.poll_max_interval_ms < self.poll_interval_ms {
            warn!(
                poll_max_interval_ms = self.poll_max_interval_ms,
                poll_interval_ms = self.poll_interval_ms,
                "poll_max_interval_ms below poll_interval_ms, raising"
            );
            self.poll_max_interval_ms = self.poll_interval_ms;
        }

        if self.max_consecutive_errors == 0 {
            warn!(using = monitor::MAX_CONSECUTIVE_ERRORS, "max_consecutive_errors must be non-zero, using default");
            self.max_consecutive_errors = monitor::MAX_CONSECUTIVE_ERRORS;
        }

        if self.restart_command.trim().is_empty() {
            warn!(using = restart::DEFAULT_COMMAND, "Empty restart_command, using default");
            self.restart_command = default_restart_command();
        }
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_max_interval: Duration::from_millis(self.poll_max_interval_ms),
            max_consecutive_errors: self.max_consecutive_errors,
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
        }
    }
}
