//! End-to-end: snapshot, watch handoff and label merge against the in-memory
//! store.

use std::sync::Arc;
use std::time::Duration;

use calico_store::keys::EndpointKey;
use calico_store::keys::StoreKey;
use calico_store::metrics;
use calico_store::model::Endpoint;
use calico_store::model::EndpointChange;
use calico_store::store::DeleteOptions;
use calico_store::store::GetOptions;
use calico_store::store::SetOptions;
use calico_store::sync::LabelMergeWriter;
use calico_store::BackoffPolicy;
use calico_store::KvStore;
use calico_store::MemKvStore;
use calico_store::ResourceKey;
use calico_store::Settings;
use calico_store::WatchConfig;
use tokio_util::sync::CancellationToken;

fn endpoint(
    workload_id: &str,
    env: &str,
) -> Endpoint {
    Endpoint {
        key: EndpointKey {
            hostname: "node-1".to_string(),
            orchestrator_id: "k8s".to_string(),
            workload_id: workload_id.to_string(),
            endpoint_id: "eth0".to_string(),
        },
        state: "active".to_string(),
        name: format!("cali-{workload_id}"),
        mac: "ee:ee:ee:ee:ee:ee".to_string(),
        profile_ids: vec!["default".to_string()],
        ipv4_nets: vec!["10.65.0.2/32".to_string()],
        ipv6_nets: Vec::new(),
        labels: [("env".to_string(), env.to_string())].into_iter().collect(),
    }
}

#[tokio::test]
async fn snapshot_then_watch_then_merge() {
    let settings = Settings::default();
    let mem = MemKvStore::new(&settings.store);
    let store: Arc<dyn KvStore> = Arc::new(mem.clone());

    endpoint("wl-A", "prod").write(store.as_ref()).await.unwrap();
    store
        .set("/calico/v1/host/node-1/bird_ip", "10.0.0.1".to_string(), SetOptions::default())
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let mut handle = calico_store::start_endpoint_sync(store.clone(), &WatchConfig::default(), cancel.clone())
        .await
        .unwrap();

    assert_eq!(handle.snapshot.index, 2);
    assert_eq!(handle.snapshot.endpoints.len(), 1);
    let wl_a = handle.snapshot.endpoints["wl-A"].clone();
    assert_eq!(wl_a.labels.get("env").map(String::as_str), Some("prod"));

    // Changes after the snapshot index arrive in store order
    let mut wl_b = endpoint("wl-B", "dev");
    wl_b.write(store.as_ref()).await.unwrap();
    store
        .delete(&wl_a.path, DeleteOptions::default())
        .await
        .unwrap();

    let created = tokio::time::timeout(Duration::from_secs(2), handle.updates.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.workload_id, "wl-B");
    assert_eq!(created.index, 3);
    let EndpointChange::Upsert(projection) = created.change else {
        panic!("expected an upsert");
    };
    assert_eq!(projection.path, wl_b.key.format_path());

    let removed = tokio::time::timeout(Duration::from_secs(2), handle.updates.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(removed.is_remove());
    assert_eq!(removed.workload_id, "wl-A");
    assert_eq!(removed.index, 4);

    // Label change on wl-B keeps every other field
    let writer = LabelMergeWriter::new(store.clone(), BackoffPolicy::default());
    let new_labels = [("env".to_string(), "prod".to_string())].into_iter().collect();
    let written = writer.merge_labels(&projection.with_labels(new_labels)).await.unwrap();

    let raw = store
        .get(&written.path, GetOptions::default())
        .await
        .unwrap()
        .node
        .value
        .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["labels"]["env"], "prod");
    assert_eq!(stored["name"], "cali-wl-B");
    assert_eq!(stored["profile_ids"][0], "default");

    // A label merge is an update, not a creation: no further upsert
    assert!(tokio::time::timeout(Duration::from_millis(50), handle.updates.recv())
        .await
        .is_err());

    cancel.cancel();
    handle.task.await.unwrap().unwrap();

    assert!(metrics::gather_text().contains("endpoint_updates_total"));
}

#[tokio::test]
async fn resource_keys_round_trip_through_store_paths() {
    let store = MemKvStore::default();
    let mut ep = endpoint("wl-C", "qa");
    ep.key.endpoint_id.clear();
    ep.write(&store).await.unwrap();

    let tree = store
        .get("/calico/v1/host", GetOptions::recursive())
        .await
        .unwrap();
    let mut leaves = vec![&tree.node];
    let mut paths = Vec::new();
    while let Some(node) = leaves.pop() {
        if !node.dir {
            paths.push(node.key.clone());
        }
        leaves.extend(node.nodes.iter());
    }

    assert_eq!(paths.len(), 1);
    match calico_store::parse_path(&paths[0]) {
        Some(ResourceKey::Endpoint(key)) => {
            assert_eq!(key.workload_id, "wl-C");
            assert_eq!(key.endpoint_id.len(), 32);
            assert_eq!(key, ep.key);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}
