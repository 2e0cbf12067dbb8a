//! Typed identifiers for every resource stored under the `/calico/v1` namespace.
//!
//! Each key struct knows how to render its own store path
//! ([`StoreKey::format_path`]); the inverse direction lives in [`parse_path`],
//! which walks an ordered matcher table and returns the first hit.

mod schema;
pub use schema::*;

#[cfg(test)]
mod keys_test;

use std::fmt;

use crate::constants::HOSTS_PREFIX;
use crate::constants::POLICY_PREFIX;
use crate::constants::PROFILE_PREFIX;
use crate::constants::SEPARATOR;
use crate::Result;
use crate::SyncError;

/// Anything that can be located in the store by a hierarchical path.
///
/// Identifier fields become single path segments: they must be non-empty and
/// must not contain `/`, or the rendered path will not parse back to the same
/// key. Write paths check this with [`StoreKey::validate`].
pub trait StoreKey {
    fn format_path(&self) -> String;

    /// `(field name, value)` of every identifier segment
    fn segments(&self) -> Vec<(&'static str, &str)>;

    fn validate(&self) -> Result<()> {
        check_segments(&self.segments())
    }
}

pub(crate) fn check_segments(segments: &[(&'static str, &str)]) -> Result<()> {
    for (field, value) in segments {
        if value.is_empty() || value.contains(SEPARATOR) {
            return Err(SyncError::InvalidKey(format!("{field} {value:?} is not a valid path segment")).into());
        }
    }
    Ok(())
}

/// Identity of a workload: everything in an endpoint key except the endpoint id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Workload {
    pub hostname: String,
    pub orchestrator_id: String,
    pub workload_id: String,
}

impl Workload {
    /// Directory holding every endpoint of the workload
    pub fn endpoint_dir(&self) -> String {
        format!(
            "{HOSTS_PREFIX}/{}/workload/{}/{}/endpoint",
            self.hostname, self.orchestrator_id, self.workload_id
        )
    }

    pub fn validate(&self) -> Result<()> {
        check_segments(&[
            ("hostname", self.hostname.as_str()),
            ("orchestrator_id", self.orchestrator_id.as_str()),
            ("workload_id", self.workload_id.as_str()),
        ])
    }

    pub fn endpoint_key(
        &self,
        endpoint_id: impl Into<String>,
    ) -> EndpointKey {
        EndpointKey {
            hostname: self.hostname.clone(),
            orchestrator_id: self.orchestrator_id.clone(),
            workload_id: self.workload_id.clone(),
            endpoint_id: endpoint_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct EndpointKey {
    pub hostname: String,
    pub orchestrator_id: String,
    pub workload_id: String,
    pub endpoint_id: String,
}

impl StoreKey for EndpointKey {
    fn format_path(&self) -> String {
        format!(
            "{HOSTS_PREFIX}/{}/workload/{}/{}/endpoint/{}",
            self.hostname, self.orchestrator_id, self.workload_id, self.endpoint_id
        )
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("hostname", self.hostname.as_str()),
            ("orchestrator_id", self.orchestrator_id.as_str()),
            ("workload_id", self.workload_id.as_str()),
            ("endpoint_id", self.endpoint_id.as_str()),
        ]
    }
}

impl EndpointKey {
    pub fn workload(&self) -> Workload {
        Workload {
            hostname: self.hostname.clone(),
            orchestrator_id: self.orchestrator_id.clone(),
            workload_id: self.workload_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HostEndpointKey {
    pub hostname: String,
    pub endpoint_id: String,
}

impl StoreKey for HostEndpointKey {
    fn format_path(&self) -> String {
        format!("{HOSTS_PREFIX}/{}/endpoint/{}", self.hostname, self.endpoint_id)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("hostname", self.hostname.as_str()), ("endpoint_id", self.endpoint_id.as_str())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PolicyKey {
    pub tier_id: String,
    pub policy_id: String,
}

impl StoreKey for PolicyKey {
    fn format_path(&self) -> String {
        format!("{POLICY_PREFIX}/tier/{}/policy/{}", self.tier_id, self.policy_id)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("tier_id", self.tier_id.as_str()), ("policy_id", self.policy_id.as_str())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TierMetadataKey {
    pub tier_id: String,
}

impl StoreKey for TierMetadataKey {
    fn format_path(&self) -> String {
        format!("{POLICY_PREFIX}/tier/{}/metadata", self.tier_id)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("tier_id", self.tier_id.as_str())]
    }
}

/// Profile identity shared by the rules, tags and labels keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProfileKey {
    pub profile_id: String,
}

impl ProfileKey {
    pub fn rules(&self) -> ProfileRulesKey {
        ProfileRulesKey {
            profile_id: self.profile_id.clone(),
        }
    }

    pub fn tags(&self) -> ProfileTagsKey {
        ProfileTagsKey {
            profile_id: self.profile_id.clone(),
        }
    }

    pub fn labels(&self) -> ProfileLabelsKey {
        ProfileLabelsKey {
            profile_id: self.profile_id.clone(),
        }
    }

    /// Directory holding all of the profile's sub-keys
    pub fn dir(&self) -> String {
        format!("{PROFILE_PREFIX}/{}", self.profile_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProfileRulesKey {
    pub profile_id: String,
}

impl StoreKey for ProfileRulesKey {
    fn format_path(&self) -> String {
        format!("{PROFILE_PREFIX}/{}/rules", self.profile_id)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("profile_id", self.profile_id.as_str())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProfileTagsKey {
    pub profile_id: String,
}

impl StoreKey for ProfileTagsKey {
    fn format_path(&self) -> String {
        format!("{PROFILE_PREFIX}/{}/tags", self.profile_id)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("profile_id", self.profile_id.as_str())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProfileLabelsKey {
    pub profile_id: String,
}

impl StoreKey for ProfileLabelsKey {
    fn format_path(&self) -> String {
        format!("{PROFILE_PREFIX}/{}/labels", self.profile_id)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("profile_id", self.profile_id.as_str())]
    }
}

/// BGP peering address published by a host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HostIpKey {
    pub hostname: String,
}

impl StoreKey for HostIpKey {
    fn format_path(&self) -> String {
        format!("{HOSTS_PREFIX}/{}/bird_ip", self.hostname)
    }

    fn segments(&self) -> Vec<(&'static str, &str)> {
        vec![("hostname", self.hostname.as_str())]
    }
}

/// Result of parsing a store path: one variant per known resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Endpoint(EndpointKey),
    HostEndpoint(HostEndpointKey),
    Policy(PolicyKey),
    ProfileRules(ProfileRulesKey),
    ProfileTags(ProfileTagsKey),
    ProfileLabels(ProfileLabelsKey),
    TierMetadata(TierMetadataKey),
    HostIp(HostIpKey),
}

impl ResourceKey {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceKey::Endpoint(_) => ResourceKind::Endpoint,
            ResourceKey::HostEndpoint(_) => ResourceKind::HostEndpoint,
            ResourceKey::Policy(_) => ResourceKind::Policy,
            ResourceKey::ProfileRules(_) => ResourceKind::ProfileRules,
            ResourceKey::ProfileTags(_) => ResourceKind::ProfileTags,
            ResourceKey::ProfileLabels(_) => ResourceKind::ProfileLabels,
            ResourceKey::TierMetadata(_) => ResourceKind::TierMetadata,
            ResourceKey::HostIp(_) => ResourceKind::HostIp,
        }
    }

    pub fn as_endpoint(&self) -> Option<&EndpointKey> {
        match self {
            ResourceKey::Endpoint(key) => Some(key),
            _ => None,
        }
    }

    pub fn into_endpoint(self) -> Option<EndpointKey> {
        match self {
            ResourceKey::Endpoint(key) => Some(key),
            _ => None,
        }
    }
}

impl StoreKey for ResourceKey {
    fn format_path(&self) -> String {
        match self {
            ResourceKey::Endpoint(key) => key.format_path(),
            ResourceKey::HostEndpoint(key) => key.format_path(),
            ResourceKey::Policy(key) => key.format_path(),
            ResourceKey::ProfileRules(key) => key.format_path(),
            ResourceKey::ProfileTags(key) => key.format_path(),
            ResourceKey::ProfileLabels(key) => key.format_path(),
            ResourceKey::TierMetadata(key) => key.format_path(),
            ResourceKey::HostIp(key) => key.format_path(),
        }
    }
    fn segments(&self) -> Vec<(&'static str, &str)> {
        match self {
            ResourceKey::Endpoint(key) => key.segments(),
            ResourceKey::HostEndpoint(key) => key.segments(),
            ResourceKey::Policy(key) => key.segments(),
            ResourceKey::ProfileRules(key) => key.segments(),
            ResourceKey::ProfileTags(key) => key.segments(),
            ResourceKey::ProfileLabels(key) => key.segments(),
            ResourceKey::TierMetadata(key) => key.segments(),
            ResourceKey::HostIp(key) => key.segments(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.format_path())
    }
}

macro_rules! impl_from_key {
    ($($key:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$key> for ResourceKey {
                fn from(key: $key) -> Self {
                    ResourceKey::$variant(key)
                }
            }
        )*
    };
}

impl_from_key! {
    EndpointKey => Endpoint,
    HostEndpointKey => HostEndpoint,
    PolicyKey => Policy,
    ProfileRulesKey => ProfileRules,
    ProfileTagsKey => ProfileTags,
    ProfileLabelsKey => ProfileLabels,
    TierMetadataKey => TierMetadata,
    HostIpKey => HostIp,
}
