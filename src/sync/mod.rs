//! Endpoint synchronization: the one-shot snapshot, the change feed that
//! resumes right after it, and the label merge writer.

mod label_merge;
mod snapshot;
mod watcher;
pub use label_merge::*;
pub use snapshot::*;
pub use watcher::*;


use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::model::EndpointSync;
use crate::model::EndpointUpdate;
use crate::store::KvStore;
use crate::Result;
use crate::WatchConfig;

/// Everything a consumer needs after startup
pub struct EndpointSyncHandle {
    /// Initial state; apply it before the first update
    pub snapshot: EndpointSync,
    /// Updates committed after `snapshot.index`, in store order
    pub updates: mpsc::Receiver<EndpointUpdate>,
    /// Watch task. Resolves to the terminal error of the session, or `Ok` on
    /// cancellation or when `updates` is dropped.
    pub task: JoinHandle<Result<()>>,
}

/// Builds the initial snapshot and spawns the endpoint watch from its index.
///
/// No event is lost or duplicated across the handoff: the watch opens at
/// exactly `snapshot.index` and only yields later events.
pub async fn start_endpoint_sync(
    store: Arc<dyn KvStore>,
    config: &WatchConfig,
    cancel: CancellationToken,
) -> Result<EndpointSyncHandle> {
    let snapshot = build_initial_snapshot(store.as_ref()).await?;

    let (tx, updates) = mpsc::channel(config.channel_capacity.max(1));
    let watcher = EndpointWatcher::new(store.as_ref(), snapshot.index, cancel);
    let task = tokio::spawn(watcher.run(tx));

    info!(
        endpoints = snapshot.endpoints.len(),
        resume_index = snapshot.index,
        "endpoint sync started"
    );
    Ok(EndpointSyncHandle {
        snapshot,
        updates,
        task,
    })
}
