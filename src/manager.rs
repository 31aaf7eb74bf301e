//! Color manager
//!
//! Owns the current palette and the reload pipeline:
//! file change -> decode -> validate -> backup -> publish -> restart sentinel.
//! Construct one per process and hand references to the consumers.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::backup::{BackupStore, RestoreError};
use crate::config::Settings;
use crate::constants::restart::SENTINEL_PREFIX;
use crate::monitor::{self, ChangeHandler, ChangeNotice, FileMonitor, MonitorStatus, MonitorStrategy};
use crate::palette::{ColorMapping, LoadError, ValidationError};
use crate::state::MonitorState;

/// Where the current palette came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    Live,
    LastGood,
    LatestBackup,
    Builtin,
}

/// Result of one pass through the reload pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ReloadOutcome {
    /// New palette published and sentinel touched
    Applied { hash: String },
    /// Same content or same palette as the current one
    Unchanged,
    /// The colors file does not exist
    Missing,
    ReadFailed(String),
    DecodeFailed(String),
    Rejected(ValidationError),
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadOutcome::Applied { hash } => write!(f, "applied new colors ({})", &hash[..hash.len().min(12)]),
            ReloadOutcome::Unchanged => write!(f, "colors unchanged"),
            ReloadOutcome::Missing => write!(f, "colors file missing, keeping current colors"),
            ReloadOutcome::ReadFailed(e) => write!(f, "failed to read colors file: {e}"),
            ReloadOutcome::DecodeFailed(e) => write!(f, "colors file is not valid JSON: {e}"),
            ReloadOutcome::Rejected(e) => write!(f, "colors rejected: {e}"),
        }
    }
}

/// Snapshot of the manager for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ColorStatus {
    pub colors_file: PathBuf,
    pub colors_file_exists: bool,
    /// Whether the live file currently passes validation
    pub colors_file_valid: bool,
    pub last_good_exists: bool,
    pub backup_dir_exists: bool,
    pub backup_count: usize,
    pub latest_backup: Option<String>,
    pub source: ColorSource,
    pub monitor: Option<MonitorStatus>,
    pub strategy: Option<MonitorStrategy>,
    pub current_hash: Option<String>,
    pub generation: u64,
    pub applied_reloads: u64,
    pub rejected_reloads: u64,
    pub last_applied: Option<String>,
    pub uptime_secs: u64,
}

/// Shared with the monitor thread
struct Core {
    settings: Settings,
    backups: BackupStore,
    /// Held only to swap or clone the pointer
    current: Mutex<Arc<ColorMapping>>,
    source: Mutex<ColorSource>,
    generation: AtomicU64,
    /// Serializes the pipeline: one change at a time
    state: Mutex<MonitorState>,
    started: Instant,
}

pub struct ColorManager {
    core: Arc<Core>,
    monitor: Mutex<Option<FileMonitor>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ColorManager {
    /// Load the startup palette: live file, then last good, then the newest
    /// backup, then the built-in palette.
    pub fn new(settings: Settings) -> Self {
        ensure_parent_dirs(&settings);

        let backups = BackupStore::new(
            settings.backup_dir.clone(),
            settings.last_good_file.clone(),
            settings.max_backups,
        );

        let (mapping, source) = load_startup_palette(&settings, &backups);
        info!(source = ?source, background = %mapping.background(), "Loaded startup colors");

        if source == ColorSource::Live {
            match backups.load_last_good() {
                Ok(last_good) if last_good == mapping => {}
                _ => {
                    debug!("Seeding backups with startup colors");
                    backups.save(&mapping);
                }
            }
        }

        let baseline = monitor::content_hash(&settings.colors_file).ok().flatten();

        Self {
            core: Arc::new(Core {
                settings,
                backups,
                current: Mutex::new(Arc::new(mapping)),
                source: Mutex::new(source),
                generation: AtomicU64::new(0),
                state: Mutex::new(MonitorState::new(baseline)),
                started: Instant::now(),
            }),
            monitor: Mutex::new(None),
        }
    }

    /// Current palette. Never touches the disk.
    pub fn get_colors(&self) -> Arc<ColorMapping> {
        Arc::clone(&lock(&self.core.current))
    }

    /// Bumped on every published palette
    pub fn generation(&self) -> u64 {
        self.core.generation.load(Ordering::Acquire)
    }

    pub fn source(&self) -> ColorSource {
        *lock(&self.core.source)
    }

    /// Re-read the colors file now, even if its hash was already seen
    pub fn manual_reload(&self) -> ReloadOutcome {
        info!("Manual color reload requested");
        self.core.reload(true).unwrap_or_else(|e| {
            error!(error = %e, "Manual reload failed");
            ReloadOutcome::ReadFailed(format!("{e:#}"))
        })
    }

    /// Start the file monitor (no-op if it is already running)
    pub fn start_monitoring(&self) -> Result<()> {
        let mut slot = lock(&self.monitor);
        if let Some(existing) = slot.as_ref() {
            if existing.is_running() {
                info!("Color monitoring is already active");
                return Ok(());
            }
            warn!(status = ?existing.status(), "Replacing inactive color monitor");
        }
        if let Some(old) = slot.take() {
            old.stop();
        }

        let core = Arc::clone(&self.core);
        let handler: ChangeHandler = Box::new(move |notice: &ChangeNotice| core.handle_change(notice));

        // No baseline; the pipeline dedupes by hash
        let monitor = FileMonitor::start(
            &self.core.settings.colors_file,
            None,
            &self.core.settings.monitor_options(),
            self.core.settings.strategy,
            handler,
        )?;
        info!(strategy = ?monitor.strategy(), "Color monitoring started");
        *slot = Some(monitor);
        drop(slot);

        // Pick up anything that changed while nobody was watching
        match self.core.reload(false) {
            Ok(outcome) => debug!(outcome = %outcome, "Catch-up check"),
            Err(e) => warn!(error = %e, "Catch-up check failed"),
        }
        Ok(())
    }

    /// Stop the file monitor and drop its bookkeeping
    pub fn stop_monitoring(&self) {
        let Some(monitor) = lock(&self.monitor).take() else {
            return;
        };
        info!("Stopping color monitoring...");
        monitor.stop();
        *lock(&self.core.state) = MonitorState::default();
        info!("Color monitoring stopped");
    }

    pub fn is_monitoring(&self) -> bool {
        lock(&self.monitor).as_ref().is_some_and(FileMonitor::is_running)
    }

    pub fn monitor_status(&self) -> Option<MonitorStatus> {
        lock(&self.monitor).as_ref().map(FileMonitor::status)
    }

    pub fn status(&self) -> ColorStatus {
        let settings = &self.core.settings;
        let backups = self.core.backups.list().unwrap_or_else(|e| {
            warn!(error = ?e, "Failed to list backups");
            Vec::new()
        });
        let (monitor, strategy) = match lock(&self.monitor).as_ref() {
            Some(m) => (Some(m.status()), Some(m.strategy())),
            None => (None, None),
        };
        let state = lock(&self.core.state).clone();

        ColorStatus {
            colors_file: settings.colors_file.clone(),
            colors_file_exists: settings.colors_file.exists(),
            colors_file_valid: ColorMapping::load_from_file(&settings.colors_file).is_ok(),
            last_good_exists: settings.last_good_file.exists(),
            backup_dir_exists: settings.backup_dir.exists(),
            backup_count: backups.len(),
            latest_backup: backups.last().map(|b| b.name.clone()),
            source: self.source(),
            monitor,
            strategy,
            current_hash: monitor::content_hash(&settings.colors_file).ok().flatten(),
            generation: self.generation(),
            applied_reloads: state.applied,
            rejected_reloads: state.rejected,
            last_applied: state.last_applied.map(|t| t.to_rfc3339()),
            uptime_secs: self.core.started.elapsed().as_secs(),
        }
    }
}

impl Drop for ColorManager {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

impl Core {
    /// Monitor callback. Only read failures are errors; bad content is
    /// handled here and keeps the current palette.
    fn handle_change(&self, notice: &ChangeNotice) -> Result<()> {
        debug!(hash = %notice.hash, "Colors file changed");
        let outcome = self.reload(false)?;
        debug!(outcome = %outcome, "Change processed");
        Ok(())
    }

    fn reload(&self, force: bool) -> Result<ReloadOutcome> {
        let path = &self.settings.colors_file;
        let mut state = lock(&self.state);

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Colors file missing, keeping current colors");
                return Ok(ReloadOutcome::Missing);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let hash = hex::encode(Sha256::digest(&bytes));
        if !force && state.is_seen(&hash) {
            debug!("Colors file hash unchanged, skipping update");
            return Ok(ReloadOutcome::Unchanged);
        }
        state.mark_seen(hash.clone());

        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Colors file is not UTF-8, keeping current colors");
                state.record_rejected();
                return Ok(ReloadOutcome::DecodeFailed(e.to_string()));
            }
        };

        let mapping = match ColorMapping::parse(text) {
            Ok(mapping) => mapping,
            Err(LoadError::Invalid(e)) => {
                error!(path = %path.display(), error = %e, "Rejected new colors, keeping current colors");
                state.record_rejected();
                return Ok(ReloadOutcome::Rejected(e));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to decode colors file, keeping current colors");
                state.record_rejected();
                return Ok(ReloadOutcome::DecodeFailed(e.to_string()));
            }
        };

        if **lock(&self.current) == mapping {
            debug!("Colors unchanged after reload");
            return Ok(ReloadOutcome::Unchanged);
        }

        self.backups.save(&mapping);
        info!(background = %mapping.background(), foreground = %mapping.foreground(), "Updated colors");
        self.publish(mapping, ColorSource::Live);
        state.record_applied();
        self.touch_restart_trigger();

        Ok(ReloadOutcome::Applied { hash })
    }

    fn publish(&self, mapping: ColorMapping, source: ColorSource) {
        let next = Arc::new(mapping);
        *lock(&self.current) = next;
        *lock(&self.source) = source;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn touch_restart_trigger(&self) {
        let path = &self.settings.restart_trigger_file;
        let contents = format!("{SENTINEL_PREFIX}{}", Utc::now().timestamp());
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(path, contents));
        match result {
            Ok(()) => info!(path = %path.display(), "Created restart trigger"),
            Err(e) => error!(path = %path.display(), error = %e, "Failed to create restart trigger"),
        }
    }
}

fn load_startup_palette(settings: &Settings, backups: &BackupStore) -> (ColorMapping, ColorSource) {
    match ColorMapping::load_from_file(&settings.colors_file) {
        Ok(mapping) => return (mapping, ColorSource::Live),
        Err(e) if e.is_not_found() => {
            warn!(path = %settings.colors_file.display(), "Colors file not found, trying backups");
        }
        Err(e) => {
            warn!(path = %settings.colors_file.display(), error = %e, "Invalid colors file, trying backups");
        }
    }

    match backups.load_last_good() {
        Ok(mapping) => return (mapping, ColorSource::LastGood),
        Err(RestoreError::NotFound) => debug!("No last good colors yet"),
        Err(e) => warn!(error = %e, "Last good colors unusable"),
    }

    match backups.load_latest_backup() {
        Ok(mapping) => return (mapping, ColorSource::LatestBackup),
        Err(RestoreError::NotFound) => debug!("No color backups yet"),
        Err(e) => warn!(error = %e, "No usable color backup"),
    }

    warn!("Using built-in default colors");
    (ColorMapping::builtin(), ColorSource::Builtin)
}

fn ensure_parent_dirs(settings: &Settings) {
    let dirs = [
        Some(settings.backup_dir.as_path()),
        settings.restart_trigger_file.parent(),
        settings.last_good_file.parent(),
    ];
    for dir in dirs.into_iter().flatten() {
        if dir.as_os_str().is_empty() {
            continue;
        }
        if let Err(e) = fs::create_dir_all(dir) {
            error!(path = %dir.display(), error = %e, "Failed to create directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyPreference;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    fn palette_json(background: &str) -> String {
        let colors: Vec<String> = (0..16)
            .map(|i| format!("\"color{i}\": \"#2{i:x}2{i:x}2{i:x}\""))
            .collect();
        format!(
            r##"{{
                "wallpaper": "/tmp/wall.png",
                "special": {{ "background": "{background}", "foreground": "#eeeeee", "cursor": "#eeeeee" }},
                "colors": {{ {} }}
            }}"##,
            colors.join(", ")
        )
    }

    fn test_settings(root: &Path) -> Settings {
        Settings {
            strategy: StrategyPreference::Polling,
            settle_delay_ms: 50,
            poll_interval_ms: 10,
            poll_max_interval_ms: 20,
            stop_timeout_ms: 2_000,
            ..Settings::rooted_at(root)
        }
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    #[test]
    fn test_fresh_install_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ColorManager::new(test_settings(dir.path()));

        assert_eq!(manager.source(), ColorSource::Builtin);
        assert_eq!(*manager.get_colors(), ColorMapping::builtin());
        assert!(manager.core.backups.list().unwrap().is_empty());
    }

    #[test]
    fn test_valid_live_file_is_loaded_and_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();

        let manager = ColorManager::new(settings);
        assert_eq!(manager.source(), ColorSource::Live);
        assert_eq!(manager.get_colors().background(), "#101010");
        assert_eq!(manager.core.backups.load_last_good().unwrap().background(), "#101010");
        assert_eq!(manager.core.backups.list().unwrap().len(), 1);
    }

    #[test]
    fn test_restart_does_not_duplicate_seed_backup() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();

        drop(ColorManager::new(settings.clone()));
        let manager = ColorManager::new(settings);
        assert_eq!(manager.core.backups.list().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_live_file_falls_back_to_last_good() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#202020")).unwrap();
        drop(ColorManager::new(settings.clone()));

        fs::write(&settings.colors_file, palette_json("#11111 1")).unwrap();
        let manager = ColorManager::new(settings);
        assert_eq!(manager.source(), ColorSource::LastGood);
        assert_eq!(manager.get_colors().background(), "#202020");
    }

    #[test]
    fn test_corrupt_last_good_falls_back_to_latest_backup() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#303030")).unwrap();
        drop(ColorManager::new(settings.clone()));

        fs::remove_file(&settings.colors_file).unwrap();
        fs::write(&settings.last_good_file, "{ corrupt").unwrap();
        let manager = ColorManager::new(settings);
        assert_eq!(manager.source(), ColorSource::LatestBackup);
        assert_eq!(manager.get_colors().background(), "#303030");
    }

    #[test]
    fn test_reload_applies_new_colors() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());

        fs::write(&settings.colors_file, palette_json("#404040")).unwrap();
        let outcome = manager.manual_reload();

        assert!(matches!(outcome, ReloadOutcome::Applied { .. }));
        assert_eq!(manager.get_colors().background(), "#404040");
        assert_eq!(manager.generation(), 1);
        assert_eq!(manager.core.backups.list().unwrap().len(), 2);
        assert_eq!(manager.core.backups.load_last_good().unwrap().background(), "#404040");

        let sentinel = fs::read_to_string(&settings.restart_trigger_file).unwrap();
        assert!(sentinel.starts_with(SENTINEL_PREFIX));
    }

    #[test]
    fn test_malformed_color_is_rejected_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());
        let before = manager.get_colors();

        fs::write(&settings.colors_file, palette_json("#11111 1")).unwrap();
        let outcome = manager.manual_reload();

        assert_eq!(
            outcome,
            ReloadOutcome::Rejected(ValidationError::MalformedColor {
                key: "background".into(),
                value: "#11111 1".into(),
            })
        );
        assert_eq!(manager.get_colors(), before);
        assert_eq!(manager.generation(), 0);
        assert_eq!(manager.core.backups.list().unwrap().len(), 1);
        assert!(!settings.restart_trigger_file.exists());
        assert_eq!(manager.status().rejected_reloads, 1);
    }

    #[test]
    fn test_decode_failure_keeps_colors() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());

        fs::write(&settings.colors_file, "{ \"special\": ").unwrap();
        assert!(matches!(manager.manual_reload(), ReloadOutcome::DecodeFailed(_)));
        assert_eq!(manager.get_colors().background(), "#101010");
        assert!(!settings.restart_trigger_file.exists());
        assert_eq!(manager.status().rejected_reloads, 1);

        fs::write(&settings.colors_file, [0xff, 0xfe, b'{', b'}']).unwrap();
        assert!(matches!(manager.manual_reload(), ReloadOutcome::DecodeFailed(_)));
        assert_eq!(manager.status().rejected_reloads, 2);
        assert_eq!(manager.core.backups.list().unwrap().len(), 1);
    }

    #[test]
    fn test_backup_write_failure_does_not_block_reload() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        // A regular file where the backup directory should be
        fs::write(&settings.backup_dir, "not a directory").unwrap();
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());
        assert_eq!(manager.get_colors().background(), "#101010");

        fs::write(&settings.colors_file, palette_json("#404040")).unwrap();
        assert!(matches!(manager.manual_reload(), ReloadOutcome::Applied { .. }));
        assert_eq!(manager.get_colors().background(), "#404040");
        assert!(settings.restart_trigger_file.exists());
        assert!(settings.backup_dir.is_file());
    }

    #[test]
    fn test_identical_palette_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());

        assert_eq!(manager.manual_reload(), ReloadOutcome::Unchanged);
        assert!(!settings.restart_trigger_file.exists());
    }

    #[test]
    fn test_deleted_file_keeps_last_colors() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#505050")).unwrap();
        let manager = ColorManager::new(settings.clone());

        fs::remove_file(&settings.colors_file).unwrap();
        assert_eq!(manager.manual_reload(), ReloadOutcome::Missing);
        assert_eq!(manager.get_colors().background(), "#505050");
    }

    #[test]
    fn test_monitoring_applies_changes() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());

        manager.start_monitoring().unwrap();
        assert!(manager.is_monitoring());
        // Second start is a no-op
        manager.start_monitoring().unwrap();

        fs::write(&settings.colors_file, palette_json("#606060")).unwrap();
        assert!(wait_until(Duration::from_secs(5), || manager.get_colors().background() == "#606060"));
        assert!(settings.restart_trigger_file.exists());

        // Deleting the file leaves the colors alone
        fs::remove_file(&settings.colors_file).unwrap();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(manager.get_colors().background(), "#606060");
        assert!(manager.is_monitoring());

        manager.stop_monitoring();
        assert!(!manager.is_monitoring());
        assert_eq!(manager.monitor_status(), None);
    }

    #[test]
    fn test_start_monitoring_catches_up_and_sees_reverts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            strategy: StrategyPreference::Auto,
            ..test_settings(dir.path())
        };
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings.clone());

        // Written while nobody was watching
        fs::write(&settings.colors_file, palette_json("#707070")).unwrap();
        manager.start_monitoring().unwrap();
        assert_eq!(manager.get_colors().background(), "#707070");

        // Content the manager saw before monitoring started is still reported
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        assert!(wait_until(Duration::from_secs(5), || manager.get_colors().background() == "#101010"));
        manager.stop_monitoring();
    }

    #[test]
    fn test_monitor_failure_keeps_colors() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        // Every read of a directory fails
        fs::create_dir_all(&settings.colors_file).unwrap();
        let manager = ColorManager::new(settings);
        assert_eq!(manager.source(), ColorSource::Builtin);

        manager.start_monitoring().unwrap();
        assert!(wait_until(Duration::from_secs(5), || {
            manager.monitor_status() == Some(MonitorStatus::Failed)
        }));
        assert!(!manager.is_monitoring());
        assert_eq!(*manager.get_colors(), ColorMapping::builtin());
    }

    #[test]
    fn test_status_report() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        fs::write(&settings.colors_file, palette_json("#101010")).unwrap();
        let manager = ColorManager::new(settings);

        let status = manager.status();
        assert!(status.colors_file_exists);
        assert!(status.colors_file_valid);
        assert!(status.last_good_exists);
        assert_eq!(status.backup_count, 1);
        assert!(status.latest_backup.is_some());
        assert_eq!(status.source, ColorSource::Live);
        assert_eq!(status.monitor, None);
        assert!(status.current_hash.is_some());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["source"], "live");
    }
}
