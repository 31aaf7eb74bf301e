//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Config file location
pub mod config {
    /// Directory under the XDG config dir
    pub const APP_DIR: &str = "colorwatch";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    /// Env var overriding the watched colors file
    pub const ENV_COLORS_FILE: &str = "COLORWATCH_COLORS_FILE";

    /// Env var overriding the backup directory
    pub const ENV_BACKUP_DIR: &str = "COLORWATCH_BACKUP_DIR";

    /// Env var overriding the restart trigger sentinel
    pub const ENV_TRIGGER_FILE: &str = "COLORWATCH_TRIGGER_FILE";

    /// Env var overriding the monitor strategy (auto|events|polling)
    pub const ENV_STRATEGY: &str = "COLORWATCH_STRATEGY";
}

/// Default file locations (relative to the XDG cache / config dirs)
pub mod paths {
    /// Colorscheme generator output, under the cache dir
    pub const COLORS_FILE: &str = "wal/colors.json";

    /// Timestamped snapshots, under the cache dir
    pub const BACKUP_DIR: &str = "wal/backups";

    /// Last known good palette, under the cache dir
    pub const LAST_GOOD_FILE: &str = "wal/last_good_colors.json";

    /// Last good file name, placed beside an overridden backup directory
    pub const LAST_GOOD_NAME: &str = "last_good_colors.json";

    /// Restart sentinel observed by the window manager, under the config dir
    pub const RESTART_TRIGGER_FILE: &str = "qtile/restart_trigger";
}

/// Palette structure
pub mod palette {
    /// Nested sections whose entries are lifted into the role set
    pub const ROLE_SECTIONS: [&str; 2] = ["special", "colors"];

    /// Special roles that must always be present
    pub const REQUIRED_SPECIAL: [&str; 3] = ["background", "foreground", "cursor"];

    /// Number of indexed terminal colors (color0..color15)
    pub const INDEXED_COLORS: usize = 16;

    /// `#` followed by exactly six hex digits
    pub const HEX_COLOR_PATTERN: &str = "^#[0-9a-fA-F]{6}$";
}

/// Backup store
pub mod backup {
    /// Timestamped backup prefix
    pub const PREFIX: &str = "colors_";

    /// Backup file extension
    pub const EXTENSION: &str = ".json";

    /// chrono format for the timestamp part of a backup name (fixed width)
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

    /// Number of timestamped backups retained
    pub const MAX_BACKUPS: usize = 10;
}

/// File monitor timings
pub mod monitor {
    /// Wait after the last change before reading the file (ms)
    pub const SETTLE_DELAY_MS: u64 = 200;

    /// Initial polling interval (ms)
    pub const POLL_INTERVAL_MS: u64 = 1_000;

    /// Polling backoff ceiling (ms)
    pub const POLL_MAX_INTERVAL_MS: u64 = 30_000;

    /// Consecutive errors tolerated before the monitor gives up
    pub const MAX_CONSECUTIVE_ERRORS: u32 = 10;

    /// Upper bound on joining the monitor thread (ms)
    pub const STOP_TIMEOUT_MS: u64 = 5_000;

    /// Poll granularity while waiting for a thread to finish (ms)
    pub const JOIN_POLL_MS: u64 = 10;
}

/// Restart sentinel
pub mod restart {
    /// Command used by `watch` to restart the window manager
    pub const DEFAULT_COMMAND: &str = "qtile cmd-obj -o cmd -f restart";

    /// Sentinel content prefix, followed by unix seconds
    pub const SENTINEL_PREFIX: &str = "restart_";

    /// Initial sentinel check interval (ms)
    pub const CHECK_INTERVAL_MS: u64 = 1_000;

    /// Ceiling for the idle check interval (ms)
    pub const MAX_CHECK_INTERVAL_MS: u64 = 15_000;

    /// Idle growth factor applied to the check interval
    pub const IDLE_GROWTH: f64 = 1.02;

    /// Error backoff ceiling (ms)
    pub const MAX_ERROR_BACKOFF_MS: u64 = 30_000;
}
