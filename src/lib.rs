//! Typed key schema for network-policy resources kept in a hierarchical
//! key-value store, plus the endpoint synchronization pipeline built on it:
//! a one-shot snapshot, a resumable change feed and a label merge writer.

mod config;
pub mod constants;
mod errors;
pub mod keys;
pub mod metrics;
pub mod model;
pub mod store;
pub mod sync;

pub use config::*;
pub use errors::*;
pub use keys::parse_path;
pub use keys::ResourceKey;
pub use store::KvStore;
pub use store::MemKvStore;
pub use sync::build_initial_snapshot;
pub use sync::merge_labels;
pub use sync::start_endpoint_sync;
pub use sync::watch_endpoints;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
mod test_utils;
