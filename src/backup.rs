//! Backup store for validated palettes
//!
//! Keeps a rolling window of timestamped snapshots plus a single
//! "last good" slot. Snapshot names sort in creation order, so the
//! directory listing doubles as the FIFO.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::constants::backup::{EXTENSION, PREFIX, TIMESTAMP_FORMAT};
use crate::palette::{ColorMapping, LoadError};

/// Length of a `TIMESTAMP_FORMAT` rendering (YYYYmmdd_HHMMSS_ffffff)
const TIMESTAMP_LEN: usize = 22;

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("no saved palette found")]
    NotFound,

    #[error("saved palette {path} is unusable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
}

/// One timestamped snapshot on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    /// UTC creation time parsed from the name
    pub created: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    last_good: PathBuf,
    max_backups: usize,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>, last_good: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            dir: dir.into(),
            last_good: last_good.into(),
            max_backups: max_backups.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn last_good_path(&self) -> &Path {
        &self.last_good
    }

    /// Snapshot `mapping` and make it the last good palette.
    ///
    /// Failures are logged, never returned: a missed backup must not stop a
    /// reload. Returns whether both writes succeeded.
    pub fn save(&self, mapping: &ColorMapping) -> bool {
        let contents = match mapping.to_json_pretty() {
            Ok(contents) => contents,
            Err(e) => {
                error!(error = %e, "Failed to serialize palette for backup");
                return false;
            }
        };

        let snapshot = match self.write_snapshot(&contents) {
            Ok(path) => {
                debug!(path = %path.display(), "Created color backup");
                if let Err(e) = self.prune() {
                    error!(error = ?e, "Failed to prune old backups");
                }
                true
            }
            Err(e) => {
                error!(error = ?e, "Failed to create color backup");
                false
            }
        };

        let last_good = match write_atomic(&self.last_good, &contents) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.last_good.display(), error = %e, "Failed to update last good colors");
                false
            }
        };

        snapshot && last_good
    }

    fn write_snapshot(&self, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create backup directory {}", self.dir.display()))?;

        let path = self.next_snapshot_path();
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write backup {}", path.display()))?;
        Ok(path)
    }

    /// Unique name for a snapshot taken now. Same-instant collisions get a
    /// `_NN` suffix, which sorts after the bare name.
    fn next_snapshot_path(&self) -> PathBuf {
        let stamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let base = self.dir.join(format!("{PREFIX}{stamp}{EXTENSION}"));
        if !base.exists() {
            return base;
        }
        (1..100)
            .map(|n| self.dir.join(format!("{PREFIX}{stamp}_{n:02}{EXTENSION}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }

    /// Drop the oldest snapshots until at most `max_backups` remain
    fn prune(&self) -> Result<()> {
        let backups = self.list()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for old in backups.iter().take(excess) {
            fs::remove_file(&old.path)
                .with_context(|| format!("Failed to remove old backup {}", old.path.display()))?;
            debug!(backup = %old.name, "Removed old backup");
        }
        Ok(())
    }

    /// Snapshots, oldest first
    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read backup directory {}", self.dir.display()));
            }
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_snapshot_name(&name) {
                continue;
            }
            backups.push(BackupEntry {
                created: parse_created(&name),
                path: entry.path(),
                name,
            });
        }
        backups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(backups)
    }

    pub fn load_last_good(&self) -> Result<ColorMapping, RestoreError> {
        match ColorMapping::load_from_file(&self.last_good) {
            Ok(mapping) => Ok(mapping),
            Err(e) if e.is_not_found() => Err(RestoreError::NotFound),
            Err(source) => Err(RestoreError::Corrupt {
                path: self.last_good.clone(),
                source,
            }),
        }
    }

    /// Newest snapshot that still loads; broken ones are skipped
    pub fn load_latest_backup(&self) -> Result<ColorMapping, RestoreError> {
        let backups = self.list().unwrap_or_else(|e| {
            warn!(error = ?e, "Failed to list backups");
            Vec::new()
        });

        let mut newest_failure = None;
        for backup in backups.iter().rev() {
            match ColorMapping::load_from_file(&backup.path) {
                Ok(mapping) => {
                    debug!(backup = %backup.name, "Loaded latest usable backup");
                    return Ok(mapping);
                }
                Err(source) => {
                    warn!(backup = %backup.name, error = %source, "Skipping unusable backup");
                    newest_failure.get_or_insert(RestoreError::Corrupt {
                        path: backup.path.clone(),
                        source,
                    });
                }
            }
        }

        Err(newest_failure.unwrap_or(RestoreError::NotFound))
    }

    /// Copy a named snapshot over `target` after validating it
    pub fn restore(&self, name: &str, target: &Path) -> Result<ColorMapping> {
        if !is_snapshot_name(name) {
            anyhow::bail!("'{name}' is not a backup name");
        }
        let path = self.dir.join(name);
        let mapping = ColorMapping::load_from_file(&path)
            .with_context(|| format!("Backup {name} is not usable"))?;
        self.restore_mapping(&mapping, target)?;
        info!(backup = %name, target = %target.display(), "Restored colors from backup");
        Ok(mapping)
    }

    /// Copy the last good palette over `target`
    pub fn restore_last_good(&self, target: &Path) -> Result<ColorMapping> {
        let mapping = self.load_last_good()?;
        self.restore_mapping(&mapping, target)?;
        info!(target = %target.display(), "Restored last good colors");
        Ok(mapping)
    }

    fn restore_mapping(&self, mapping: &ColorMapping, target: &Path) -> Result<()> {
        let contents = mapping.to_json_pretty().context("Failed to serialize palette")?;
        write_atomic(target, &contents)
            .with_context(|| format!("Failed to write {}", target.display()))
    }
}

fn is_snapshot_name(name: &str) -> bool {
    name.starts_with(PREFIX)
        && name.ends_with(EXTENSION)
        && !name.contains(std::path::MAIN_SEPARATOR)
        && !name.contains('/')
}

fn parse_created(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(PREFIX)?.get(..TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Write through a sibling temp file so readers never see a partial file
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::validate;
    use serde_json::{Value, json};

    fn store(root: &Path) -> BackupStore {
        BackupStore::new(root.join("backups"), root.join("last_good_colors.json"), 10)
    }

    fn palette(background: &str) -> ColorMapping {
        let mut map = serde_json::Map::new();
        map.insert("wallpaper".into(), json!("/tmp/wall.png"));
        let mut special = serde_json::Map::new();
        special.insert("background".into(), json!(background));
        special.insert("foreground".into(), json!("#eeeeee"));
        special.insert("cursor".into(), json!("#eeeeee"));
        map.insert("special".into(), Value::Object(special));
        let mut colors = serde_json::Map::new();
        for i in 0..16 {
            colors.insert(format!("color{i}"), json!("#123456"));
        }
        map.insert("colors".into(), Value::Object(colors));
        validate(Value::Object(map)).unwrap()
    }

    #[test]
    fn test_save_then_load_last_good_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let mapping = palette("#101010");

        assert!(store.save(&mapping));
        assert_eq!(store.load_last_good().unwrap(), mapping);
        assert_eq!(store.load_latest_backup().unwrap(), mapping);
    }

    #[test]
    fn test_backup_keeps_input_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let mapping = palette("#101010");
        store.save(&mapping);

        let written: Value =
            serde_json::from_str(&fs::read_to_string(store.last_good_path()).unwrap()).unwrap();
        assert_eq!(written["special"]["background"], json!("#101010"));
        assert_eq!(written["wallpaper"], json!("/tmp/wall.png"));
    }

    #[test]
    fn test_prunes_to_ten_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let mut names = Vec::new();
        for i in 0..13 {
            store.save(&palette(&format!("#0000{i:02x}")));
            names.push(store.list().unwrap().last().unwrap().name.clone());
        }

        let remaining: Vec<String> = store.list().unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(remaining.len(), 10);
        assert_eq!(remaining, names[3..].to_vec());
        assert_eq!(store.load_latest_backup().unwrap().background(), "#00000c");
        assert_eq!(store.load_last_good().unwrap().background(), "#00000c");
    }

    #[test]
    fn test_empty_store_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(matches!(store.load_last_good(), Err(RestoreError::NotFound)));
        assert!(matches!(store.load_latest_backup(), Err(RestoreError::NotFound)));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_last_good_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::write(store.last_good_path(), "{ truncated").unwrap();

        assert!(matches!(store.load_last_good(), Err(RestoreError::Corrupt { .. })));
    }

    #[test]
    fn test_latest_backup_skips_corrupt_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&palette("#abcdef"));
        fs::write(store.dir().join("colors_99991231_235959_999999.json"), "garbage").unwrap();

        assert_eq!(store.load_latest_backup().unwrap().background(), "#abcdef");
    }

    #[test]
    fn test_only_corrupt_snapshots_reports_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("colors_20240101_000000_000000.json"), "{}").unwrap();

        assert!(matches!(store.load_latest_backup(), Err(RestoreError::Corrupt { .. })));
    }

    #[test]
    fn test_list_ignores_foreign_files_and_parses_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("notes.txt"), "x").unwrap();
        fs::write(store.dir().join("colors_20240102_030405_000006.json"), "{}").unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        let created = list[0].created.unwrap();
        assert_eq!(created.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_restore_named_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let mapping = palette("#445566");
        store.save(&mapping);
        let name = store.list().unwrap()[0].name.clone();
        let target = dir.path().join("colors.json");

        let restored = store.restore(&name, &target).unwrap();
        assert_eq!(restored, mapping);
        assert_eq!(ColorMapping::load_from_file(&target).unwrap(), mapping);
    }

    #[test]
    fn test_restore_rejects_foreign_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let target = dir.path().join("colors.json");

        assert!(store.restore("../last_good_colors.json", &target).is_err());
        assert!(store.restore("colors_missing.json", &target).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_restore_last_good() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let target = dir.path().join("colors.json");
        assert!(store.restore_last_good(&target).is_err());

        let mapping = palette("#778899");
        store.save(&mapping);
        assert_eq!(store.restore_last_good(&target).unwrap(), mapping);
    }
}
