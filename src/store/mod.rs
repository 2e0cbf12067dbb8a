//! Key-value store collaborator.
//!
//! The synchronization pipeline only needs three capabilities from the store:
//! a (possibly recursive) read, a conditional write, and a watch that yields
//! one change event at a time after a given index. [`KvStore`] captures them;
//! network behavior, retries and timeouts belong to the implementation.
//!
//! [`MemKvStore`] is a hierarchical in-memory implementation with the same
//! index and event semantics.

mod mem_store;
pub use mem_store::*;


#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::StoreResult;

/// Change kind reported by the store for a response or watch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Get,
    Set,
    Create,
    Update,
    Delete,
    Expire,
    CompareAndSwap,
    CompareAndDelete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Set => "set",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Expire => "expire",
            Action::CompareAndSwap => "compareAndSwap",
            Action::CompareAndDelete => "compareAndDelete",
        }
    }
}

/// One node of a store response tree: either a leaf carrying a value or a
/// directory carrying children.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub dir: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub created_index: u64,
    #[serde(default)]
    pub modified_index: u64,
}

impl Node {
    pub fn leaf(
        key: impl Into<String>,
        value: impl Into<String>,
        modified_index: u64,
    ) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            dir: false,
            nodes: Vec::new(),
            created_index: modified_index,
            modified_index,
        }
    }

    pub fn directory(
        key: impl Into<String>,
        nodes: Vec<Node>,
    ) -> Self {
        Self {
            key: key.into(),
            value: None,
            dir: true,
            nodes,
            created_index: 0,
            modified_index: 0,
        }
    }

    /// Value of a leaf; directories and tombstones yield an empty string
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// A store reply. For watch events `index` is the index the change was
/// committed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub action: Action,
    pub node: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_node: Option<Node>,
    pub index: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub recursive: bool,
}

impl GetOptions {
    pub fn recursive() -> Self {
        Self { recursive: true }
    }
}

/// Preconditions of a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Compare-and-swap guard: the write only applies if the node's
    /// `modified_index` still equals this value
    pub prev_index: Option<u64>,
    /// `Some(false)` creates only, `Some(true)` updates only
    pub prev_exist: Option<bool>,
}

impl SetOptions {
    pub fn compare_and_swap(prev_index: u64) -> Self {
        Self {
            prev_index: Some(prev_index),
            prev_exist: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Only events committed strictly after this index are returned
    pub after_index: u64,
    pub recursive: bool,
}

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Reads a key, or a directory tree when `opts.recursive` is set.
    ///
    /// # Errors
    /// - [`crate::StoreError::NotFound`] if nothing lives at `path`
    /// - [`crate::StoreError::Transport`] if the store cannot be reached
    async fn get(
        &self,
        path: &str,
        opts: GetOptions,
    ) -> StoreResult<StoreResponse>;

    /// Writes a leaf value, honoring the preconditions in `opts`.
    ///
    /// # Errors
    /// - [`crate::StoreError::CompareFailed`] if `prev_index` no longer matches
    /// - [`crate::StoreError::NodeExists`] / [`crate::StoreError::NotFound`] for
    ///   `prev_exist` violations
    /// - [`crate::StoreError::NotAFile`] if `path` is a directory
    async fn set(
        &self,
        path: &str,
        value: String,
        opts: SetOptions,
    ) -> StoreResult<StoreResponse>;

    async fn delete(
        &self,
        path: &str,
        opts: DeleteOptions,
    ) -> StoreResult<StoreResponse>;

    /// Opens a watch on `path`. Events are pulled one at a time with
    /// [`StoreWatcher::next`].
    fn watcher(
        &self,
        path: &str,
        opts: WatcherOptions,
    ) -> Box<dyn StoreWatcher>;
}

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait StoreWatcher: Send {
    /// Waits for the next change after the last returned event.
    ///
    /// Every error is fatal for this watcher; a new one has to be opened with
    /// an explicit resume index.
    async fn next(&mut self) -> StoreResult<StoreResponse>;
}
