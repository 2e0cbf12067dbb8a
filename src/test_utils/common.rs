use crate::keys::EndpointKey;
use crate::keys::StoreKey;
use crate::store::Action;
use crate::store::Node;
use crate::store::StoreResponse;

pub(crate) fn endpoint_key(
    host: &str,
    workload_id: &str,
) -> EndpointKey {
    EndpointKey {
        hostname: host.to_string(),
        orchestrator_id: "k8s".to_string(),
        workload_id: workload_id.to_string(),
        endpoint_id: "eth0".to_string(),
    }
}

pub(crate) fn endpoint_path(
    host: &str,
    workload_id: &str,
) -> String {
    endpoint_key(host, workload_id).format_path()
}

/// Endpoint document with the given labels and a few unrelated fields
pub(crate) fn endpoint_doc(labels: &[(&str, &str)]) -> String {
    let labels: serde_json::Map<String, serde_json::Value> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    serde_json::json!({
        "state": "active",
        "name": "cali12345",
        "mac": "ee:ee:ee:ee:ee:ee",
        "profile_ids": ["default"],
        "ipv4_nets": ["10.65.0.2/32"],
        "ipv6_nets": [],
        "labels": labels,
    })
    .to_string()
}

pub(crate) fn endpoint_leaf(
    host: &str,
    workload_id: &str,
    labels: &[(&str, &str)],
    modified_index: u64,
) -> Node {
    Node::leaf(endpoint_path(host, workload_id), endpoint_doc(labels), modified_index)
}

/// Wraps `leaf` in the directory chain from `/calico/v1/host` down to it
pub(crate) fn nest_under_hosts(leaf: Node) -> Node {
    let segments: Vec<&str> = leaf.key.trim_start_matches('/').split('/').collect();
    // calico/v1/host is the root; stop before the leaf itself
    let mut node = leaf.clone();
    for depth in (3..segments.len() - 1).rev() {
        let dir_key = format!("/{}", segments[..=depth].join("/"));
        node = Node::directory(dir_key, vec![node]);
    }
    node
}

pub(crate) fn created_event(
    node: Node,
    index: u64,
) -> StoreResponse {
    StoreResponse {
        action: Action::Set,
        node,
        prev_node: None,
        index,
    }
}

pub(crate) fn updated_event(
    node: Node,
    prev: Node,
    index: u64,
) -> StoreResponse {
    StoreResponse {
        action: Action::Set,
        node,
        prev_node: Some(prev),
        index,
    }
}

pub(crate) fn deleted_event(
    key: &str,
    index: u64,
) -> StoreResponse {
    StoreResponse {
        action: Action::Delete,
        node: Node {
            key: key.to_string(),
            modified_index: index,
            ..Default::default()
        },
        prev_node: None,
        index,
    }
}
