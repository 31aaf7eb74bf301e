//! Configuration management for colorwatch
//!
//! - **settings**: daemon settings (paths, monitor timings, restart command)

pub mod settings;

// Re-export commonly used types
pub use settings::{Settings, StrategyPreference};
