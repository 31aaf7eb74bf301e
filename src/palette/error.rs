use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

/// Why a candidate palette was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("color document is not a JSON object")]
    NotAnObject,

    #[error("missing required color roles: {}", join(missing))]
    MissingKeys { missing: BTreeSet<String> },

    #[error("malformed color for '{key}': {value} (expected #RRGGBB)")]
    MalformedColor { key: String, value: String },
}

/// Failure to turn a file or string into a validated palette
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl LoadError {
    /// File does not exist (as opposed to being unreadable)
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

fn join(keys: &BTreeSet<String>) -> String {
    keys.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
