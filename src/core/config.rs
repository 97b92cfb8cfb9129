//! # Provider Configuration
//!
//! Tunables for `ChunkProvider`. Every field has a default, so an empty JSON
//! object is a valid configuration:
//!
//! ```json
//! {
//!     "load_workers": 10,
//!     "save_queue_capacity": 300,
//!     "save_failure_policy": "fail_stop",
//!     "duplicate_policy": "append"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ChunkIoError;

/// Number of load worker threads when nothing else is configured.
pub const DEFAULT_LOAD_WORKERS: usize = 10;

/// Maximum number of positions waiting for the save worker.
pub const DEFAULT_SAVE_QUEUE_CAPACITY: usize = 300;

/// What the save worker does after a save fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFailurePolicy {
    /// The first failed save stops the save worker for good. Positions queued
    /// afterwards are accepted but never persisted.
    #[default]
    FailStop,
    /// Failed saves are logged and counted; the worker moves on to the next
    /// position.
    Continue,
}

/// How the chunk cache treats a second chunk added at an occupied position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep every chunk. Concurrent loads of one position leave several
    /// entries; lookups return the oldest.
    #[default]
    Append,
    /// Drop the incoming chunk if the position is already cached.
    KeepFirst,
    /// The incoming chunk replaces whatever is cached at the position.
    Replace,
}

/// Sizing and failure handling of a `ChunkProvider`.
///
/// Every field is optional in JSON; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub load_workers: usize,
    pub save_queue_capacity: usize,
    pub save_failure_policy: SaveFailurePolicy,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            load_workers: DEFAULT_LOAD_WORKERS,
            save_queue_capacity: DEFAULT_SAVE_QUEUE_CAPACITY,
            save_failure_policy: SaveFailurePolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl ProviderConfig {
    /// Parses a config from JSON and normalizes it.
    ///
    /// # Errors
    /// Returns `ChunkIoError::Serialization` for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ChunkIoError> {
        Ok(serde_json::from_str::<Self>(json)?.normalized())
    }

    /// Reads and parses a JSON config file.
    ///
    /// # Errors
    /// Returns `ChunkIoError::Io` if the file cannot be read, otherwise the
    /// errors of `from_json_str`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ChunkIoError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Clamps worker count and queue capacity to at least one.
    ///
    /// A pool without workers would accept loads that never run, and a
    /// zero-capacity queue would reject every save.
    pub fn normalized(mut self) -> Self {
        self.load_workers = self.load_workers.max(1);
        self.save_queue_capacity = self.save_queue_capacity.max(1);
        self
    }

    /// Sets the number of load worker threads.
    pub fn with_load_workers(mut self, load_workers: usize) -> Self {
        self.load_workers = load_workers;
        self
    }

    /// Sets how many saves may be pending at once.
    pub fn with_save_queue_capacity(mut self, capacity: usize) -> Self {
        self.save_queue_capacity = capacity;
        self
    }

    /// Sets what the save worker does after a failed save.
    pub fn with_save_failure_policy(mut self, policy: SaveFailurePolicy) -> Self {
        self.save_failure_policy = policy;
        self
    }

    /// Sets how the cache treats a second chunk at an occupied position.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ProviderConfig::from_json_str("{}").unwrap();

        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.load_workers, 10);
        assert_eq!(config.save_queue_capacity, 300);
        assert_eq!(config.save_failure_policy, SaveFailurePolicy::FailStop);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Append);
    }

    #[test]
    fn policies_use_snake_case_names() {
        let config = ProviderConfig::from_json_str(
            r#"{ "save_failure_policy": "continue", "duplicate_policy": "keep_first" }"#,
        )
        .unwrap();

        assert_eq!(config.save_failure_policy, SaveFailurePolicy::Continue);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepFirst);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let config =
            ProviderConfig::from_json_str(r#"{ "load_workers": 0, "save_queue_capacity": 0 }"#)
                .unwrap();

        assert_eq!(config.load_workers, 1);
        assert_eq!(config.save_queue_capacity, 1);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = ProviderConfig::from_json_str(r#"{ "save_failure_policy": "retry" }"#);

        assert!(matches!(result, Err(ChunkIoError::Serialization(_))));
    }

    #[test]
    fn reads_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.json");
        std::fs::write(&path, r#"{ "load_workers": 3 }"#).unwrap();

        let config = ProviderConfig::from_json_file(&path).unwrap();

        assert_eq!(config.load_workers, 3);
        assert_eq!(config.save_queue_capacity, DEFAULT_SAVE_QUEUE_CAPACITY);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ProviderConfig::from_json_file("/definitely/not/here.json");

        assert!(matches!(result, Err(ChunkIoError::Io(_))));
    }
}
