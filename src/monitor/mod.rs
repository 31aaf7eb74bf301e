//! Background file monitor
//!
//! Watches a single file and calls a handler when its content hash changes.
//! Two strategies, picked once at start: filesystem events via `notify`, or
//! polling with exponential backoff on read errors. Both wait for the file to
//! settle before reading it and collapse bursts of changes into one call.

mod worker;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::StrategyPreference;
use crate::constants::monitor as defaults;
use worker::Worker;

/// Timings and limits for a monitor thread
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    /// Quiet period required after the last change before reading
    pub settle_delay: Duration,
    /// Polling interval when reads succeed
    pub poll_interval: Duration,
    /// Backoff ceiling for polling after read errors
    pub poll_max_interval: Duration,
    /// The monitor gives up once this many consecutive errors are exceeded
    pub max_consecutive_errors: u32,
    /// Upper bound on joining the thread in `stop()`
    pub stop_timeout: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(defaults::SETTLE_DELAY_MS),
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            poll_max_interval: Duration::from_millis(defaults::POLL_MAX_INTERVAL_MS),
            max_consecutive_errors: defaults::MAX_CONSECUTIVE_ERRORS,
            stop_timeout: Duration::from_millis(defaults::STOP_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStrategy {
    EventDriven,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    Running,
    Stopped,
    /// Gave up after too many consecutive errors; needs a restart
    Failed,
}

/// Delivered to the handler once the watched file settled on new content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub path: PathBuf,
    /// SHA-256 of the file content, hex encoded
    pub hash: String,
}

/// Called on the monitor thread. Errors count towards the failure limit.
pub type ChangeHandler = Box<dyn FnMut(&ChangeNotice) -> Result<()> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Joined,
    /// The thread did not finish in time and was detached
    TimedOut,
}

/// Messages to the monitor thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    FsEvent,
    Stop,
}

/// State shared between the owner and the monitor thread
struct Shared {
    status: Mutex<MonitorStatus>,
    /// Cleared by stop(); checked before every handler call
    accepting: AtomicBool,
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, MonitorStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }
}

pub struct FileMonitor {
    path: PathBuf,
    strategy: MonitorStrategy,
    shared: Arc<Shared>,
    signals: Sender<Signal>,
    thread: Option<JoinHandle<()>>,
    watcher: Option<RecommendedWatcher>,
    stop_timeout: Duration,
}

impl FileMonitor {
    /// Start watching `path` on a background thread.
    ///
    /// `baseline` is the hash the caller already processed; only content that
    /// differs from it is reported.
    pub fn start(
        path: &Path,
        baseline: Option<String>,
        options: &MonitorOptions,
        preference: StrategyPreference,
        handler: ChangeHandler,
    ) -> Result<Self> {
        let (signals, receiver) = mpsc::channel();

        let watcher = match preference {
            StrategyPreference::Polling => None,
            StrategyPreference::Events => Some(
                event_watcher(path, signals.clone())
                    .context("Event-driven file monitoring unavailable")?,
            ),
            StrategyPreference::Auto => match event_watcher(path, signals.clone()) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    info!(error = %e, "Filesystem events unavailable, falling back to polling");
                    None
                }
            },
        };
        let strategy = if watcher.is_some() {
            MonitorStrategy::EventDriven
        } else {
            MonitorStrategy::Polling
        };

        let shared = Arc::new(Shared {
            status: Mutex::new(MonitorStatus::Running),
            accepting: AtomicBool::new(true),
        });

        let worker = Worker::new(
            path.to_path_buf(),
            baseline,
            options.clone(),
            handler,
            Arc::clone(&shared),
            receiver,
        );
        let thread = thread::Builder::new()
            .name("color-monitor".into())
            .spawn(move || match strategy {
                MonitorStrategy::EventDriven => worker.run_events(),
                MonitorStrategy::Polling => worker.run_polling(),
            })
            .context("Failed to spawn monitor thread")?;

        info!(path = %path.display(), strategy = ?strategy, "File monitor started");

        Ok(Self {
            path: path.to_path_buf(),
            strategy,
            shared,
            signals,
            thread: Some(thread),
            watcher,
            stop_timeout: options.stop_timeout,
        })
    }

    pub fn strategy(&self) -> MonitorStrategy {
        self.strategy
    }

    pub fn status(&self) -> MonitorStatus {
        *self.shared.status()
    }

    pub fn is_running(&self) -> bool {
        self.status() == MonitorStatus::Running
    }

    /// Stop the thread. No handler call starts after this returns.
    pub fn stop(mut self) -> StopOutcome {
        self.shutdown()
    }

    fn shutdown(&mut self) -> StopOutcome {
        let Some(thread) = self.thread.take() else {
            return StopOutcome::Joined;
        };

        // An in-flight handler call may outlive a timed out stop, but no new one starts
        self.shared.accepting.store(false, Ordering::SeqCst);
        let _ = self.signals.send(Signal::Stop);
        drop(self.watcher.take());

        let outcome = if join_with_timeout(thread, self.stop_timeout) {
            StopOutcome::Joined
        } else {
            warn!(
                path = %self.path.display(),
                timeout_ms = self.stop_timeout.as_millis() as u64,
                "Monitor thread did not stop in time, detaching"
            );
            StopOutcome::TimedOut
        };

        let mut status = self.shared.status();
        if *status == MonitorStatus::Running {
            *status = MonitorStatus::Stopped;
        }
        info!(path = %self.path.display(), "File monitor stopped");
        outcome
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Join `thread` unless it is still running after `timeout`, in which case
/// it is detached. Returns whether it was joined.
pub(crate) fn join_with_timeout(thread: JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !thread.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(defaults::JOIN_POLL_MS));
    }
    if !thread.is_finished() {
        return false;
    }
    if thread.join().is_err() {
        warn!("Background thread panicked");
    }
    true
}

/// Watch the parent directory so atomic replaces (write + rename) are seen
fn event_watcher(path: &Path, signals: Sender<Signal>) -> Result<RecommendedWatcher> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .with_context(|| format!("{} has no file name", path.display()))?;

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else {
            return;
        };
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        if event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
        {
            debug!(kind = ?event.kind, "Filesystem event for watched file");
            let _ = signals.send(Signal::FsEvent);
        }
    })
    .context("Failed to create filesystem watcher")?;

    watcher
        .watch(&parent, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", parent.display()))?;
    Ok(watcher)
}

/// SHA-256 of the file content; `None` if the file does not exist
pub fn content_hash(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(hex::encode(Sha256::digest(&bytes)))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
