//! Endpoint change feed.
//!
//! Pulls raw change events from a store watcher one at a time and turns them
//! into typed [`EndpointUpdate`]s:
//!
//! - a newly created node is flattened like a snapshot leaf and must resolve
//!   to at most one workload; more than one is a schema violation
//! - a deleted endpoint path, or a deleted workload directory, becomes a
//!   removal; so does a compare-and-delete of either
//! - everything else (overwrites, expirations, compare-and-swap) is dropped
//!
//! The watcher keeps no state besides its resume index. Each step observes the
//! cancellation token before suspending on the store.

use futures::stream;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::flatten_node;
use super::Flattened;
use crate::constants::HOSTS_PREFIX;
use crate::keys::parse_endpoint_path;
use crate::keys::parse_workload_dir;
use crate::metrics::ENDPOINT_UPDATES_METRIC;
use crate::metrics::IGNORED_EVENTS_METRIC;
use crate::metrics::SKIPPED_RECORDS_METRIC;
use crate::model::EndpointUpdate;
use crate::store::Action;
use crate::store::KvStore;
use crate::store::StoreResponse;
use crate::store::StoreWatcher;
use crate::store::WatcherOptions;
use crate::Result;
use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Value newly set, no prior value
    Created,
    Deleted,
    Ignored,
}

pub fn classify(response: &StoreResponse) -> EventClass {
    match response.action {
        Action::Set | Action::Create if response.prev_node.is_none() => EventClass::Created,
        Action::Delete | Action::CompareAndDelete => EventClass::Deleted,
        _ => EventClass::Ignored,
    }
}

pub struct EndpointWatcher {
    watcher: Box<dyn StoreWatcher>,
    resume_index: u64,
    cancel: CancellationToken,
    skipped: u64,
}

impl EndpointWatcher {
    /// Opens a recursive watch on the hosts subtree for events committed
    /// after `resume_index`
    pub fn new(
        store: &dyn KvStore,
        resume_index: u64,
        cancel: CancellationToken,
    ) -> Self {
        let watcher = store.watcher(
            HOSTS_PREFIX,
            WatcherOptions {
                after_index: resume_index,
                recursive: true,
            },
        );
        Self::from_watcher(watcher, resume_index, cancel)
    }

    pub fn from_watcher(
        watcher: Box<dyn StoreWatcher>,
        resume_index: u64,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            watcher,
            resume_index,
            cancel,
            skipped: 0,
        }
    }

    /// Index of the last event consumed, applied or not
    pub fn resume_index(&self) -> u64 {
        self.resume_index
    }

    /// Number of created endpoint records dropped because they failed to decode
    pub fn skipped_records(&self) -> u64 {
        self.skipped
    }

    /// Waits for the next endpoint update.
    ///
    /// # Returns
    /// - `Ok(Some(update))` for every created or deleted endpoint
    /// - `Ok(None)` once the cancellation token fires
    /// - `Err(_)` on a store failure or a schema violation; the session is
    ///   over and a new watcher must be started from the caller's last applied
    ///   index
    pub async fn next_update(&mut self) -> Result<Option<EndpointUpdate>> {
        loop {
            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!(resume_index = self.resume_index, "endpoint watch cancelled");
                    return Ok(None);
                }
                next = self.watcher.next() => next.map_err(|e| {
                    error!(resume_index = self.resume_index, error = %e, "endpoint watch failed");
                    e
                })?,
            };

            if response.index <= self.resume_index {
                warn!(
                    index = response.index,
                    resume_index = self.resume_index,
                    path = %response.node.key,
                    "dropping event at or before the resume index"
                );
                continue;
            }
            self.resume_index = response.index;

            if let Some(update) = self.process(response)? {
                return Ok(Some(update));
            }
        }
    }

    fn process(
        &mut self,
        response: StoreResponse,
    ) -> Result<Option<EndpointUpdate>> {
        let index = response.index;
        match classify(&response) {
            EventClass::Created => {
                let mut flattened = Flattened::default();
                flatten_node(&response.node, &mut flattened);
                if !flattened.skipped.is_empty() {
                    self.skipped += flattened.skipped.len() as u64;
                    SKIPPED_RECORDS_METRIC
                        .with_label_values(&["watch"])
                        .inc_by(flattened.skipped.len() as u64);
                }

                let mut entries: Vec<_> = flattened.endpoints.into_iter().collect();
                if entries.len() > 1 {
                    let mut workloads: Vec<String> = entries.into_iter().map(|(w, _)| w).collect();
                    workloads.sort();
                    error!(index, path = %response.node.key, ?workloads, "event resolved to several workloads");
                    return Err(SyncError::SchemaViolation {
                        path: response.node.key,
                        index,
                        workloads,
                    }
                    .into());
                }

                match entries.pop() {
                    Some((workload_id, endpoint)) => {
                        debug!(index, workload_id = %workload_id, "endpoint created");
                        ENDPOINT_UPDATES_METRIC.with_label_values(&["upsert"]).inc();
                        Ok(Some(EndpointUpdate::upsert(workload_id, endpoint, index)))
                    }
                    None => {
                        trace!(index, path = %response.node.key, "created node outside the endpoint schema");
                        Ok(None)
                    }
                }
            }
            EventClass::Deleted => {
                // A recursive delete of a workload directory carries only the
                // directory path; it removes every endpoint below it.
                let removed = parse_endpoint_path(&response.node.key)
                    .map(|key| key.workload_id)
                    .or_else(|| parse_workload_dir(&response.node.key).map(|w| w.workload_id));
                match removed {
                    Some(workload_id) => {
                        debug!(index, workload_id = %workload_id, "endpoint removed");
                        ENDPOINT_UPDATES_METRIC.with_label_values(&["remove"]).inc();
                        Ok(Some(EndpointUpdate::remove(workload_id, index)))
                    }
                    None => {
                        trace!(index, path = %response.node.key, "deleted node outside the endpoint schema");
                        Ok(None)
                    }
                }
            }
            EventClass::Ignored => {
                debug!(index, action = response.action.as_str(), path = %response.node.key, "ignoring event");
                IGNORED_EVENTS_METRIC
                    .with_label_values(&[response.action.as_str()])
                    .inc();
                Ok(None)
            }
        }
    }

    /// Forwards updates into `tx` until cancellation, a terminal error, or the
    /// receiver going away.
    pub async fn run(
        mut self,
        tx: mpsc::Sender<EndpointUpdate>,
    ) -> Result<()> {
        info!(path = HOSTS_PREFIX, resume_index = self.resume_index, "endpoint watch started");
        while let Some(update) = self.next_update().await? {
            if tx.send(update).await.is_err() {
                info!(resume_index = self.resume_index, "update receiver dropped, stopping watch");
                return Ok(());
            }
        }
        info!(resume_index = self.resume_index, "endpoint watch stopped");
        Ok(())
    }

    /// Stream view of [`next_update`](Self::next_update).
    ///
    /// Ends after cancellation, or right after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<EndpointUpdate>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut watcher = state?;
            match watcher.next_update().await {
                Ok(Some(update)) => Some((Ok(update), Some(watcher))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Runs an endpoint watch from `resume_index`, delivering updates into `tx`
pub async fn watch_endpoints(
    store: &dyn KvStore,
    resume_index: u64,
    tx: mpsc::Sender<EndpointUpdate>,
    cancel: CancellationToken,
) -> Result<()> {
    EndpointWatcher::new(store, resume_index, cancel).run(tx).await
}
