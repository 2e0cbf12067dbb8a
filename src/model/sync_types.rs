use std::collections::HashMap;

use serde::Deserialize;

use super::deserialize_labels;
use super::Labels;
use crate::store::Node;

/// Projection of an endpoint carrying only its labels.
///
/// The raw stored document and its path travel along so that a label change
/// can be merged back without knowing any of the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelOnlyEndpoint {
    pub labels: Labels,
    /// Store path the document was read from
    pub path: String,
    /// Document exactly as stored
    pub raw_document: String,
    /// `modified_index` of the document when it was read; guards the
    /// compare-and-swap of a label merge. `0` means unknown.
    pub revision: u64,
}

#[derive(Deserialize)]
struct LabelsField {
    #[serde(default, deserialize_with = "deserialize_labels")]
    labels: Labels,
}

impl LabelOnlyEndpoint {
    /// Extracts the labels of a stored endpoint document.
    ///
    /// The document must be a JSON object; a missing or `null` labels field
    /// yields an empty label set.
    pub fn parse(
        path: impl Into<String>,
        raw_document: impl Into<String>,
        revision: u64,
    ) -> std::result::Result<Self, serde_json::Error> {
        let raw_document = raw_document.into();
        let value: serde_json::Value = serde_json::from_str(&raw_document)?;
        if !value.is_object() {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "endpoint document is not a JSON object",
            ));
        }
        let LabelsField { labels } = serde_json::from_value(value)?;
        Ok(Self {
            labels,
            path: path.into(),
            raw_document,
            revision,
        })
    }

    pub fn from_node(node: &Node) -> std::result::Result<Self, serde_json::Error> {
        Self::parse(node.key.clone(), node.value_str(), node.modified_index)
    }

    /// Same document with a new label set, ready for a merge
    pub fn with_labels(
        mut self,
        labels: Labels,
    ) -> Self {
        self.labels = labels;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointChange {
    /// Endpoint created; carries its label projection
    Upsert(LabelOnlyEndpoint),
    /// Endpoint deleted
    Remove,
}

/// One typed change of the endpoint subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUpdate {
    pub workload_id: String,
    pub change: EndpointChange,
    /// Store index the change was committed at
    pub index: u64,
}

impl EndpointUpdate {
    pub fn upsert(
        workload_id: impl Into<String>,
        endpoint: LabelOnlyEndpoint,
        index: u64,
    ) -> Self {
        Self {
            workload_id: workload_id.into(),
            change: EndpointChange::Upsert(endpoint),
            index,
        }
    }

    pub fn remove(
        workload_id: impl Into<String>,
        index: u64,
    ) -> Self {
        Self {
            workload_id: workload_id.into(),
            change: EndpointChange::Remove,
            index,
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self.change, EndpointChange::Remove)
    }

    pub fn endpoint(&self) -> Option<&LabelOnlyEndpoint> {
        match &self.change {
            EndpointChange::Upsert(endpoint) => Some(endpoint),
            EndpointChange::Remove => None,
        }
    }
}

/// A matched record that could not be decoded and was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub path: String,
    pub reason: String,
}

/// Initial endpoint state read in one pass at startup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointSync {
    /// Keyed by workload id
    pub endpoints: HashMap<String, LabelOnlyEndpoint>,
    /// Store index of the read; the watch resumes right after it
    pub index: u64,
    /// Endpoint records skipped because they failed to decode
    pub skipped: Vec<SkippedRecord>,
}
