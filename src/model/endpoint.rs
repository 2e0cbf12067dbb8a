use nanoid::nanoid;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::deserialize_labels;
use super::Labels;
use crate::keys::parse_endpoint_path;
use crate::keys::EndpointKey;
use crate::keys::HostEndpointKey;
use crate::keys::StoreKey;
use crate::keys::Workload;
use crate::store::GetOptions;
use crate::store::KvStore;
use crate::store::SetOptions;
use crate::store::StoreResponse;
use crate::Result;
use crate::SyncError;

const ENDPOINT_ID_ALPHABET: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// Workload-attached network interface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(skip)]
    pub key: EndpointKey,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub profile_ids: Vec<String>,
    #[serde(default)]
    pub ipv4_nets: Vec<String>,
    #[serde(default)]
    pub ipv6_nets: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_labels",
        skip_serializing_if = "Labels::is_empty"
    )]
    pub labels: Labels,
}

/// Interface of the host itself rather than of a workload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostEndpoint {
    #[serde(skip)]
    pub key: HostEndpointKey,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub profile_ids: Vec<String>,
    #[serde(default)]
    pub expected_ipv4_addrs: Vec<String>,
    #[serde(default)]
    pub expected_ipv6_addrs: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_labels",
        skip_serializing_if = "Labels::is_empty"
    )]
    pub labels: Labels,
}

pub fn parse_endpoint(
    key: EndpointKey,
    raw: &str,
) -> std::result::Result<Endpoint, serde_json::Error> {
    let mut endpoint: Endpoint = serde_json::from_str(raw)?;
    endpoint.key = key;
    Ok(endpoint)
}

pub fn parse_host_endpoint(
    key: HostEndpointKey,
    raw: &str,
) -> std::result::Result<HostEndpoint, serde_json::Error> {
    let mut host_endpoint: HostEndpoint = serde_json::from_str(raw)?;
    host_endpoint.key = key;
    Ok(host_endpoint)
}

impl Endpoint {
    /// Stores the full record at its key, generating an endpoint id first if
    /// none was assigned.
    pub async fn write(
        &mut self,
        store: &dyn KvStore,
    ) -> Result<StoreResponse> {
        if self.key.endpoint_id.is_empty() {
            self.key.endpoint_id = nanoid!(32, &ENDPOINT_ID_ALPHABET);
        }
        self.key.validate()?;
        let path = self.key.format_path();
        let value = serde_json::to_string(self).map_err(SyncError::from)?;

        debug!(path = %path, "writing endpoint");
        Ok(store.set(&path, value, SetOptions::default()).await?)
    }
}

impl HostEndpoint {
    pub async fn write(
        &self,
        store: &dyn KvStore,
    ) -> Result<StoreResponse> {
        self.key.validate()?;
        let path = self.key.format_path();
        let value = serde_json::to_string(self).map_err(SyncError::from)?;
        Ok(store.set(&path, value, SetOptions::default()).await?)
    }
}

/// Reads the endpoint of `workload`.
///
/// Returns `Ok(None)` when the workload has no endpoint yet.
pub async fn get_endpoint(
    store: &dyn KvStore,
    workload: &Workload,
) -> Result<Option<Endpoint>> {
    workload.validate()?;
    let dir = workload.endpoint_dir();
    let response = match store.get(&dir, GetOptions::recursive()).await {
        Ok(response) => response,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let Some(node) = response.node.nodes.iter().find(|n| !n.dir) else {
        return Ok(None);
    };
    let key = parse_endpoint_path(&node.key).ok_or_else(|| SyncError::InvalidKey(node.key.clone()))?;
    let endpoint = parse_endpoint(key, node.value_str()).map_err(|source| SyncError::MalformedRecord {
        path: node.key.clone(),
        source,
    })?;
    Ok(Some(endpoint))
}
