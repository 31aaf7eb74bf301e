use chrono::{DateTime, Utc};
use tracing::debug;

/// Runtime bookkeeping for the reload pipeline
/// Lives only as long as monitoring does (not persisted to disk)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MonitorState {
    /// Hash of the last processed file content (None = absent / never read)
    pub last_hash: Option<String>,

    /// When a palette was last applied
    pub last_applied: Option<DateTime<Utc>>,

    pub applied: u64,
    pub rejected: u64,
}

impl MonitorState {
    pub fn new(last_hash: Option<String>) -> Self {
        Self {
            last_hash,
            ..Self::default()
        }
    }

    /// True if `hash` was already processed
    pub fn is_seen(&self, hash: &str) -> bool {
        self.last_hash.as_deref() == Some(hash)
    }

    pub fn mark_seen(&mut self, hash: String) {
        debug!(hash = %hash, "Recording processed content hash");
        self.last_hash = Some(hash);
    }

    pub fn record_applied(&mut self) {
        self.applied += 1;
        self.last_applied = Some(Utc::now());
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }
}
