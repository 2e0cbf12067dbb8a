//! Initial endpoint snapshot.
//!
//! One recursive read of the hosts subtree, flattened into a map keyed by
//! workload id. Leaves outside the endpoint schema are walked past; endpoint
//! leaves that fail to decode are skipped and reported.

use std::collections::HashMap;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::constants::HOSTS_PREFIX;
use crate::keys::parse_endpoint_path;
use crate::metrics::SKIPPED_RECORDS_METRIC;
use crate::model::EndpointSync;
use crate::model::LabelOnlyEndpoint;
use crate::model::SkippedRecord;
use crate::store::GetOptions;
use crate::store::KvStore;
use crate::store::Node;
use crate::Result;
use crate::StoreError;

/// Accumulator filled by [`flatten_node`]
#[derive(Debug, Default)]
pub struct Flattened {
    pub endpoints: HashMap<String, LabelOnlyEndpoint>,
    pub skipped: Vec<SkippedRecord>,
}

/// Depth-first walk of `node`, collecting every endpoint leaf.
///
/// A later leaf for the same workload replaces an earlier one.
pub fn flatten_node(
    node: &Node,
    out: &mut Flattened,
) {
    if !node.dir {
        if let Some(key) = parse_endpoint_path(&node.key) {
            match LabelOnlyEndpoint::from_node(node) {
                Ok(endpoint) => {
                    debug!(path = %node.key, workload_id = %key.workload_id, "endpoint leaf");
                    out.endpoints.insert(key.workload_id, endpoint);
                }
                Err(e) => {
                    warn!(path = %node.key, error = %e, "skipping malformed endpoint record");
                    out.skipped.push(SkippedRecord {
                        path: node.key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
    for child in &node.nodes {
        flatten_node(child, out);
    }
}

/// Reads the whole hosts subtree and returns the endpoint map along with the
/// store index the watch must resume after.
///
/// A missing subtree is "no endpoints yet", not an error.
pub async fn build_initial_snapshot(store: &dyn KvStore) -> Result<EndpointSync> {
    let mut flattened = Flattened::default();
    let index = match store.get(HOSTS_PREFIX, GetOptions::recursive()).await {
        Ok(response) => {
            flatten_node(&response.node, &mut flattened);
            response.index
        }
        Err(StoreError::NotFound { index, .. }) => {
            info!(path = HOSTS_PREFIX, index, "no hosts subtree yet, starting from an empty snapshot");
            index
        }
        Err(e) => return Err(e.into()),
    };

    if !flattened.skipped.is_empty() {
        SKIPPED_RECORDS_METRIC
            .with_label_values(&["snapshot"])
            .inc_by(flattened.skipped.len() as u64);
    }
    info!(
        endpoints = flattened.endpoints.len(),
        skipped = flattened.skipped.len(),
        index,
        "endpoint snapshot complete"
    );

    Ok(EndpointSync {
        endpoints: flattened.endpoints,
        index,
        skipped: flattened.skipped,
    })
}
