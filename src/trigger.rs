//! Restart sentinel consumer
//!
//! Runs on the window-manager side: waits for the sentinel the color manager
//! touches, removes it and runs the restart action. The check interval
//! starts short, stretches while nothing happens and snaps back after a
//! trigger.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::constants::restart;
use crate::monitor::join_with_timeout;

/// Run when the sentinel is found
pub type RestartAction = Box<dyn FnMut() -> Result<()> + Send>;

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOptions {
    pub check_interval: Duration,
    pub max_check_interval: Duration,
    pub max_consecutive_errors: u32,
    pub stop_timeout: Duration,
}

impl TriggerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            check_interval: Duration::from_millis(restart::CHECK_INTERVAL_MS),
            max_check_interval: Duration::from_millis(restart::MAX_CHECK_INTERVAL_MS),
            max_consecutive_errors: settings.max_consecutive_errors,
            stop_timeout: Duration::from_millis(settings.stop_timeout_ms),
        }
    }
}

/// Restart action running `command` through `sh -c`
pub fn shell_action(command: &str) -> RestartAction {
    let command = command.to_string();
    Box::new(move || {
        info!(command = %command, "Running restart command");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status()
            .with_context(|| format!("Failed to run '{command}'"))?;
        if !status.success() {
            anyhow::bail!("'{command}' exited with {status}");
        }
        Ok(())
    })
}

/// Consume the sentinel if present. Returns whether the action ran.
pub fn consume_trigger(path: &Path, action: &mut RestartAction) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to remove restart trigger {}", path.display()));
        }
    }
    info!(path = %path.display(), "Color change detected - restarting");
    action()?;
    Ok(true)
}

pub struct RestartTriggerWatcher {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl RestartTriggerWatcher {
    pub fn spawn(path: PathBuf, options: TriggerOptions, mut action: RestartAction) -> Result<Self> {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let stop_timeout = options.stop_timeout;

        let thread = thread::Builder::new()
            .name("restart-trigger".into())
            .spawn(move || {
                let mut interval = options.check_interval;
                let mut consecutive_errors = 0u32;

                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    }

                    match consume_trigger(&path, &mut action) {
                        Ok(true) => {
                            consecutive_errors = 0;
                            interval = options.check_interval;
                        }
                        Ok(false) => {
                            consecutive_errors = 0;
                            interval = interval
                                .mul_f64(restart::IDLE_GROWTH)
                                .min(options.max_check_interval);
                        }
                        Err(e) => {
                            consecutive_errors += 1;
                            error!(error = %e, consecutive_errors, "Restart trigger check failed");
                            if consecutive_errors > options.max_consecutive_errors {
                                error!("Too many consecutive restart trigger errors, stopping");
                                return;
                            }
                            interval = Duration::from_secs(1u64 << consecutive_errors.min(16))
                                .min(Duration::from_millis(restart::MAX_ERROR_BACKOFF_MS))
                                .max(options.check_interval);
                            warn!(delay_ms = interval.as_millis() as u64, "Restart trigger backing off");
                        }
                    }
                }
            })
            .context("Failed to spawn restart trigger thread")?;

        Ok(Self {
            stop,
            thread: Some(thread),
            stop_timeout,
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.stop.send(());
            if !join_with_timeout(thread, self.stop_timeout) {
                warn!("Restart trigger thread did not stop in time, detaching");
            }
        }
    }
}

impl Drop for RestartTriggerWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
