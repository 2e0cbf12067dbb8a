use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::constants::DEFAULT_EVENT_HISTORY_CAPACITY;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Number of change events the in-memory store keeps for watchers.
    /// Resuming from an index older than this window fails with
    /// `StoreError::IndexCleared`.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(invalid("store.history_capacity must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn default_history_capacity() -> usize {
    DEFAULT_EVENT_HISTORY_CAPACITY
}
