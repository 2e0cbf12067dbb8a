use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct BackoffPolicy {
    /// Maximum number of attempts, the first one included
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based), doubling from the base
    /// and capped at `max_delay_ms`
    pub fn delay_for(
        &self,
        attempt: usize,
    ) -> Duration {
        let shift = attempt.saturating_sub(1).min(32) as u32;
        let delay = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    fn validate(
        &self,
        name: &str,
    ) -> Result<()> {
        if self.max_retries == 0 {
            return Err(invalid(format!("retry.{name}.max_retries must be greater than 0")));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(invalid(format!(
                "retry.{name}.base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Divide strategies by write path
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RetryPolicies {
    // Compare-and-swap loop of the label merge writer
    #[serde(default)]
    pub label_merge: BackoffPolicy,
}

impl RetryPolicies {
    pub fn validate(&self) -> Result<()> {
        self.label_merge.validate("label_merge")
    }
}

fn default_max_retries() -> usize {
    5
}
fn default_base_delay_ms() -> u64 {
    10
}
fn default_max_delay_ms() -> u64 {
    500
}
