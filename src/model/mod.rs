//! Resource records stored under the key schema, and the value objects the
//! synchronization pipeline hands to its consumers.

pub mod api;
mod endpoint;
mod policy;
mod profile;
mod sync_types;
pub use endpoint::*;
pub use policy::*;
pub use profile::*;
pub use sync_types::*;

#[cfg(test)]
mod profile_test;

use std::collections::BTreeMap;

/// Label set attached to endpoints and profiles
pub type Labels = BTreeMap<String, String>;

/// Accepts a missing or `null` labels field as an empty set
pub(crate) fn deserialize_labels<'de, D>(deserializer: D) -> std::result::Result<Labels, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Ok(Option::<Labels>::deserialize(deserializer)?.unwrap_or_default())
}
