//! Settings for the synchronization pipeline.
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Hardcoded defaults
//! 2. An explicit config file (if given)
//! 3. The file named by `CONFIG_PATH` (if set)
//! 4. Environment variables prefixed `CALICO__` (highest priority)

mod retry;
mod store;
mod watch;
pub use retry::*;
pub use store::*;
pub use watch::*;


//---
use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Update handoff between the watch task and its consumer
    #[serde(default)]
    pub watch: WatchConfig,
    /// In-memory store parameters
    #[serde(default)]
    pub store: StoreConfig,
    /// Retry policies for conditional writes
    #[serde(default)]
    pub retry: RetryPolicies,
}

impl Settings {
    /// Loads defaults, then `path`, then `CONFIG_PATH`, then `CALICO__*`
    /// environment variables, and validates the merged result.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }
        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CALICO")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()
    }

    /// Checks every section, consuming and returning the settings on success
    pub fn validate(self) -> Result<Self> {
        self.watch.validate()?;
        self.store.validate()?;
        self.retry.validate()?;
        Ok(self)
    }
}

pub(super) fn invalid(message: String) -> Error {
    Error::Config(ConfigError::Message(message))
}
