//! Writes label changes back into stored endpoint documents.
//!
//! Only the `labels` field of the stored JSON object is replaced; every other
//! field, known or not, is written back as read and in the same order. Each
//! write is a compare-and-swap on the revision the document was read at, so a
//! concurrent writer makes the merge re-read and try again instead of being
//! silently overwritten.

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::constants::LABELS_FIELD;
use crate::metrics::LABEL_MERGE_CONFLICTS_METRIC;
use crate::metrics::LABEL_MERGE_FAILURES_METRIC;
use crate::model::LabelOnlyEndpoint;
use crate::model::Labels;
use crate::store::GetOptions;
use crate::store::KvStore;
use crate::store::SetOptions;
use crate::BackoffPolicy;
use crate::Result;
use crate::StoreError;
use crate::SyncError;

/// Label merge bound to a store and a retry policy
#[derive(Clone)]
pub struct LabelMergeWriter {
    store: Arc<dyn KvStore>,
    policy: BackoffPolicy,
}

impl LabelMergeWriter {
    pub fn new(
        store: Arc<dyn KvStore>,
        policy: BackoffPolicy,
    ) -> Self {
        Self { store, policy }
    }

    pub async fn merge_labels(
        &self,
        update: &LabelOnlyEndpoint,
    ) -> Result<LabelOnlyEndpoint> {
        merge_labels(self.store.as_ref(), update, &self.policy).await
    }
}

/// Replaces the labels of the document stored at `update.path` with
/// `update.labels`.
///
/// The first attempt is guarded by `update.revision` and reuses
/// `update.raw_document`; a revision of `0` reads the current document first.
/// Each compare-and-swap conflict re-reads the document and retries after a
/// backoff, up to `policy.max_retries` attempts in total.
///
/// # Returns
/// The projection of the document as written, carrying its new revision.
///
/// # Errors
/// - [`SyncError::WriteConflict`] once every attempt lost a race
/// - [`SyncError::InvalidDocument`] when the stored value is not a JSON object
/// - [`StoreError::NotFound`] when the endpoint was deleted meanwhile
pub async fn merge_labels(
    store: &dyn KvStore,
    update: &LabelOnlyEndpoint,
    policy: &BackoffPolicy,
) -> Result<LabelOnlyEndpoint> {
    let path = update.path.as_str();
    let (mut raw, mut revision) = if update.revision == 0 {
        read_document(store, path).await?
    } else {
        (update.raw_document.clone(), update.revision)
    };

    for attempt in 1..=policy.max_retries {
        let merged = replace_labels(path, &raw, &update.labels)?;

        match store
            .set(path, merged.clone(), SetOptions::compare_and_swap(revision))
            .await
        {
            Ok(response) => {
                debug!(path, attempt, revision = response.node.modified_index, "labels merged");
                return Ok(LabelOnlyEndpoint {
                    labels: update.labels.clone(),
                    path: update.path.clone(),
                    raw_document: merged,
                    revision: response.node.modified_index,
                });
            }
            Err(StoreError::CompareFailed { expected, actual, .. }) => {
                warn!(path, attempt, expected, actual, "label merge lost a compare-and-swap race");
                LABEL_MERGE_CONFLICTS_METRIC.inc();
                if attempt < policy.max_retries {
                    sleep(policy.delay_for(attempt)).await;
                    (raw, revision) = read_document(store, path).await?;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    error!(path, attempts = policy.max_retries, "label merge gave up");
    LABEL_MERGE_FAILURES_METRIC.inc();
    Err(SyncError::WriteConflict {
        path: update.path.clone(),
        attempts: policy.max_retries,
    }
    .into())
}

async fn read_document(
    store: &dyn KvStore,
    path: &str,
) -> Result<(String, u64)> {
    let response = store.get(path, GetOptions::default()).await?;
    if response.node.dir {
        return Err(SyncError::InvalidDocument {
            path: path.to_string(),
            reason: "path is a directory".to_string(),
        }
        .into());
    }
    Ok((response.node.value_str().to_string(), response.node.modified_index))
}

/// Re-serializes `raw` with its labels field set to `labels`
pub(crate) fn replace_labels(
    path: &str,
    raw: &str,
    labels: &Labels,
) -> Result<String> {
    let invalid = |reason: String| SyncError::InvalidDocument {
        path: path.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(mut document) = value else {
        return Err(invalid("document is not a JSON object".to_string()).into());
    };

    let labels: Map<String, Value> = labels
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    document.insert(LABELS_FIELD.to_string(), Value::Object(labels));

    Ok(serde_json::to_string(&document).map_err(SyncError::from)?)
}
