use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::constants::DEFAULT_UPDATE_CHANNEL_CAPACITY;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Capacity of the bounded channel carrying endpoint updates to the
    /// consumer. A full channel suspends the watch loop.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(invalid("watch.channel_capacity must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn default_channel_capacity() -> usize {
    DEFAULT_UPDATE_CHANNEL_CAPACITY
}
