use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{ChangeHandler, ChangeNotice, MonitorOptions, MonitorStatus, Shared, Signal, content_hash};

/// Whether the monitor loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Halt,
}

/// Owned by the monitor thread
pub(super) struct Worker {
    path: PathBuf,
    last_hash: Option<String>,
    options: MonitorOptions,
    handler: ChangeHandler,
    shared: Arc<Shared>,
    signals: Receiver<Signal>,
    consecutive_errors: u32,
}

impl Worker {
    pub(super) fn new(
        path: PathBuf,
        baseline: Option<String>,
        options: MonitorOptions,
        handler: ChangeHandler,
        shared: Arc<Shared>,
        signals: Receiver<Signal>,
    ) -> Self {
        Self {
            path,
            last_hash: baseline,
            options,
            handler,
            shared,
            signals,
            consecutive_errors: 0,
        }
    }

    /// Sleep for `timeout` unless a signal arrives first
    fn wait(&self, timeout: Duration) -> Option<Signal> {
        match self.signals.recv_timeout(timeout) {
            Ok(signal) => Some(signal),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Signal::Stop),
        }
    }

    /// Block on filesystem events; each burst is settled then checked once
    pub(super) fn run_events(mut self) {
        loop {
            match self.signals.recv() {
                Ok(Signal::FsEvent) => {}
                Ok(Signal::Stop) | Err(_) => return,
            }

            // Every event inside the window restarts it
            loop {
                match self.wait(self.options.settle_delay) {
                    Some(Signal::FsEvent) => continue,
                    Some(Signal::Stop) => return,
                    None => break,
                }
            }

            if self.check_and_deliver() == Flow::Halt {
                return;
            }
        }
    }

    /// Poll the file hash; back off exponentially while reads fail
    pub(super) fn run_polling(mut self) {
        info!(path = %self.path.display(), "Using polling for file monitoring");
        let mut interval = self.options.poll_interval;

        loop {
            if self.wait(interval) == Some(Signal::Stop) {
                return;
            }

            match content_hash(&self.path) {
                Ok(Some(hash)) if self.last_hash.as_ref() != Some(&hash) => {
                    debug!(path = %self.path.display(), "Change detected, waiting for file to settle");
                    match self.settle_polled(hash) {
                        Some(Flow::Halt) => return,
                        Some(Flow::Continue) => {}
                        None => {
                            if self.check_and_deliver() == Flow::Halt {
                                return;
                            }
                        }
                    }
                    interval = self.next_interval();
                }
                Ok(_) => {
                    self.consecutive_errors = 0;
                    interval = self.options.poll_interval;
                }
                Err(e) => {
                    if self.record_error(&format!("read failed: {e}")) == Flow::Halt {
                        return;
                    }
                    interval = self.next_interval();
                    warn!(delay_ms = interval.as_millis() as u64, "Backing off after read error");
                }
            }
        }
    }

    /// Re-read after each settle window until the hash stops moving.
    /// `None` means the file is stable and should be checked; `Some` is the
    /// flow to follow without delivering.
    fn settle_polled(&mut self, mut pending: String) -> Option<Flow> {
        loop {
            if self.wait(self.options.settle_delay) == Some(Signal::Stop) {
                return Some(Flow::Halt);
            }
            match content_hash(&self.path) {
                Ok(Some(hash)) if hash == pending => return None,
                Ok(Some(hash)) => {
                    debug!("File changed again while settling");
                    pending = hash;
                }
                Ok(None) => {
                    debug!(path = %self.path.display(), "File disappeared while settling");
                    return Some(Flow::Continue);
                }
                Err(e) => return Some(self.record_error(&format!("read failed: {e}"))),
            }
        }
    }

    fn next_interval(&self) -> Duration {
        let factor = 2u32.saturating_pow(self.consecutive_errors);
        self.options
            .poll_interval
            .saturating_mul(factor)
            .min(self.options.poll_max_interval)
    }

    /// Hash the file and hand new content to the handler
    fn check_and_deliver(&mut self) -> Flow {
        let hash = match content_hash(&self.path) {
            Ok(Some(hash)) => hash,
            Ok(None) => {
                debug!(path = %self.path.display(), "Watched file is absent");
                return Flow::Continue;
            }
            Err(e) => return self.record_error(&format!("read failed: {e}")),
        };

        if self.last_hash.as_ref() == Some(&hash) {
            debug!(path = %self.path.display(), "Content hash unchanged, skipping");
            self.consecutive_errors = 0;
            return Flow::Continue;
        }

        let notice = ChangeNotice {
            path: self.path.clone(),
            hash,
        };

        if !self.shared.is_accepting() {
            return Flow::Halt;
        }
        let result = (self.handler)(&notice);

        match result {
            Ok(()) => {
                self.last_hash = Some(notice.hash);
                self.consecutive_errors = 0;
                Flow::Continue
            }
            Err(e) => self.record_error(&format!("handler failed: {e:#}")),
        }
    }

    fn record_error(&mut self, what: &str) -> Flow {
        self.consecutive_errors += 1;
        error!(
            path = %self.path.display(),
            consecutive_errors = self.consecutive_errors,
            "File monitor error: {what}"
        );

        if self.consecutive_errors > self.options.max_consecutive_errors {
            error!(
                path = %self.path.display(),
                limit = self.options.max_consecutive_errors,
                "Too many consecutive errors, file monitor stopped permanently; restart required"
            );
            *self.shared.status() = MonitorStatus::Failed;
            return Flow::Halt;
        }
        Flow::Continue
    }
}
