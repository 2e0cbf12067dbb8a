//! In-memory hierarchical key-value store.
//!
//! Keys are kept flat in an ordered map; directories are implied by key
//! prefixes and materialized on read. Every mutation bumps a global index and
//! is appended to a bounded event history that watchers replay from.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;
use tracing::trace;

use super::Action;
use super::DeleteOptions;
use super::GetOptions;
use super::KvStore;
use super::Node;
use super::SetOptions;
use super::StoreResponse;
use super::StoreWatcher;
use super::WatcherOptions;
use crate::constants::DEFAULT_EVENT_HISTORY_CAPACITY;
use crate::constants::SEPARATOR;
use crate::StoreConfig;
use crate::StoreError;
use crate::StoreResult;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    created_index: u64,
    modified_index: u64,
}

#[derive(Debug, Default)]
struct MemState {
    entries: BTreeMap<String, Entry>,
    index: u64,
    history: VecDeque<StoreResponse>,
    /// Highest index evicted from `history`
    cleared_index: u64,
}

struct Shared {
    state: Mutex<MemState>,
    index_tx: watch::Sender<u64>,
    history_capacity: usize,
}

#[derive(Clone)]
pub struct MemKvStore {
    shared: Arc<Shared>,
}

impl Default for MemKvStore {
    fn default() -> Self {
        Self::with_history_capacity(DEFAULT_EVENT_HISTORY_CAPACITY)
    }
}

impl MemKvStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_history_capacity(config.history_capacity)
    }

    pub fn with_history_capacity(history_capacity: usize) -> Self {
        let (index_tx, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(MemState::default()),
                index_tx,
                history_capacity: history_capacity.max(1),
            }),
        }
    }

    /// Current store index
    pub fn index(&self) -> u64 {
        self.shared.state.lock().index
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strips trailing separators and forces a leading one
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches(SEPARATOR);
    format!("{SEPARATOR}{trimmed}")
}

fn child_prefix(path: &str) -> String {
    if path == "/" {
        path.to_string()
    } else {
        format!("{path}{SEPARATOR}")
    }
}

impl MemState {
    fn is_dir(
        &self,
        path: &str,
    ) -> bool {
        let prefix = child_prefix(path);
        self.entries
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }

    /// First ancestor of `path` that is stored as a leaf
    fn leaf_ancestor(
        &self,
        path: &str,
    ) -> Option<String> {
        path.match_indices(SEPARATOR)
            .map(|(i, _)| &path[..i])
            .filter(|ancestor| !ancestor.is_empty())
            .find(|ancestor| self.entries.contains_key(*ancestor))
            .map(str::to_string)
    }

    fn leaf(
        &self,
        path: &str,
    ) -> Option<Node> {
        self.entries.get(path).map(|e| Node {
            key: path.to_string(),
            value: Some(e.value.clone()),
            dir: false,
            nodes: Vec::new(),
            created_index: e.created_index,
            modified_index: e.modified_index,
        })
    }

    /// Materializes the directory at `path` from the flat key space
    fn directory(
        &self,
        path: &str,
        recursive: bool,
    ) -> Node {
        let prefix = child_prefix(path);
        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for key in self.entries.range(prefix.clone()..).map(|(k, _)| k) {
            if !key.starts_with(&prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            match rest.split_once(SEPARATOR) {
                Some((name, _)) => {
                    children.insert(format!("{prefix}{name}"), true);
                }
                None => {
                    children.entry(key.clone()).or_insert(false);
                }
            }
        }

        let nodes = children
            .into_iter()
            .map(|(child, is_dir)| {
                if is_dir {
                    if recursive {
                        self.directory(&child, true)
                    } else {
                        Node::directory(child, Vec::new())
                    }
                } else {
                    self.leaf(&child).unwrap_or_default()
                }
            })
            .collect::<Vec<_>>();

        let modified_index = nodes.iter().map(|n| n.modified_index).max().unwrap_or(0);
        let created_index = nodes.iter().map(|n| n.created_index).min().unwrap_or(0);
        Node {
            key: path.to_string(),
            value: None,
            dir: true,
            nodes,
            created_index,
            modified_index,
        }
    }

    fn commit(
        &mut self,
        response: StoreResponse,
        capacity: usize,
    ) {
        self.history.push_back(response);
        while self.history.len() > capacity {
            if let Some(evicted) = self.history.pop_front() {
                self.cleared_index = evicted.index;
            }
        }
    }
}

#[async_trait::async_trait]
impl KvStore for MemKvStore {
    async fn get(
        &self,
        path: &str,
        opts: GetOptions,
    ) -> StoreResult<StoreResponse> {
        let path = normalize_path(path);
        let state = self.shared.state.lock();

        let node = if let Some(leaf) = state.leaf(&path) {
            leaf
        } else if path == "/" || state.is_dir(&path) {
            state.directory(&path, opts.recursive)
        } else {
            return Err(StoreError::NotFound {
                path,
                index: state.index,
            });
        };

        trace!(path = %node.key, dir = node.dir, "get");
        Ok(StoreResponse {
            action: Action::Get,
            node,
            prev_node: None,
            index: state.index,
        })
    }

    async fn set(
        &self,
        path: &str,
        value: String,
        opts: SetOptions,
    ) -> StoreResult<StoreResponse> {
        let path = normalize_path(path);
        let response = {
            let mut state = self.shared.state.lock();
            if state.is_dir(&path) {
                return Err(StoreError::NotAFile { path });
            }
            if let Some(ancestor) = state.leaf_ancestor(&path) {
                return Err(StoreError::NotAFile { path: ancestor });
            }

            let existing = state.entries.get(&path).cloned();
            match (opts.prev_exist, &existing) {
                (Some(false), Some(_)) => return Err(StoreError::NodeExists { path }),
                (Some(true), None) => {
                    return Err(StoreError::NotFound {
                        path,
                        index: state.index,
                    })
                }
                _ => {}
            }
            if let Some(expected) = opts.prev_index {
                match &existing {
                    None => {
                        return Err(StoreError::NotFound {
                            path,
                            index: state.index,
                        })
                    }
                    Some(entry) if entry.modified_index != expected => {
                        return Err(StoreError::CompareFailed {
                            path,
                            expected,
                            actual: entry.modified_index,
                        })
                    }
                    Some(_) => {}
                }
            }

            let prev_node = state.leaf(&path);
            state.index += 1;
            let index = state.index;
            let created_index = existing.as_ref().map(|e| e.created_index).unwrap_or(index);
            state.entries.insert(
                path.clone(),
                Entry {
                    value: value.clone(),
                    created_index,
                    modified_index: index,
                },
            );

            let action = if opts.prev_index.is_some() {
                Action::CompareAndSwap
            } else if opts.prev_exist == Some(false) {
                Action::Create
            } else if opts.prev_exist == Some(true) {
                Action::Update
            } else {
                Action::Set
            };
            let response = StoreResponse {
                action,
                node: Node {
                    key: path.clone(),
                    value: Some(value),
                    dir: false,
                    nodes: Vec::new(),
                    created_index,
                    modified_index: index,
                },
                prev_node,
                index,
            };
            state.commit(response.clone(), self.shared.history_capacity);
            response
        };

        debug!(path = %response.node.key, index = response.index, action = response.action.as_str(), "set");
        self.shared.index_tx.send_replace(response.index);
        Ok(response)
    }

    async fn delete(
        &self,
        path: &str,
        opts: DeleteOptions,
    ) -> StoreResult<StoreResponse> {
        let path = normalize_path(path);
        let response = {
            let mut state = self.shared.state.lock();
            let (prev_node, dir) = if let Some(leaf) = state.leaf(&path) {
                state.entries.remove(&path);
                (leaf, false)
            } else if state.is_dir(&path) {
                if !opts.recursive {
                    return Err(StoreError::NotAFile { path });
                }
                let prev = state.directory(&path, true);
                let prefix = child_prefix(&path);
                state.entries.retain(|k, _| !k.starts_with(&prefix));
                (prev, true)
            } else {
                return Err(StoreError::NotFound {
                    path,
                    index: state.index,
                });
            };

            state.index += 1;
            let index = state.index;
            let response = StoreResponse {
                action: Action::Delete,
                node: Node {
                    key: path.clone(),
                    value: None,
                    dir,
                    nodes: Vec::new(),
                    created_index: prev_node.created_index,
                    modified_index: index,
                },
                prev_node: Some(prev_node),
                index,
            };
            state.commit(response.clone(), self.shared.history_capacity);
            response
        };

        debug!(path = %response.node.key, index = response.index, "delete");
        self.shared.index_tx.send_replace(response.index);
        Ok(response)
    }

    fn watcher(
        &self,
        path: &str,
        opts: WatcherOptions,
    ) -> Box<dyn StoreWatcher> {
        Box::new(MemWatcher {
            shared: self.shared.clone(),
            path: normalize_path(path),
            recursive: opts.recursive,
            after_index: opts.after_index,
            index_rx: self.shared.index_tx.subscribe(),
        })
    }
}

/// Watch cursor over a [`MemKvStore`]'s event history
pub struct MemWatcher {
    shared: Arc<Shared>,
    path: String,
    recursive: bool,
    after_index: u64,
    index_rx: watch::Receiver<u64>,
}

impl MemWatcher {
    fn covers(
        &self,
        key: &str,
    ) -> bool {
        if key == self.path {
            return true;
        }
        self.recursive && key.starts_with(&child_prefix(&self.path))
    }

    fn poll_history(&self) -> StoreResult<Option<StoreResponse>> {
        let state = self.shared.state.lock();
        if self.after_index < state.cleared_index {
            return Err(StoreError::IndexCleared {
                requested: self.after_index + 1,
                oldest: state.cleared_index + 1,
            });
        }
        Ok(state
            .history
            .iter()
            .find(|event| event.index > self.after_index && self.covers(&event.node.key))
            .cloned())
    }
}

#[async_trait::async_trait]
impl StoreWatcher for MemWatcher {
    async fn next(&mut self) -> StoreResult<StoreResponse> {
        loop {
            self.index_rx.borrow_and_update();
            if let Some(event) = self.poll_history()? {
                self.after_index = event.index;
                return Ok(event);
            }
            self.index_rx.changed().await.map_err(|_| StoreError::WatcherClosed)?;
        }
    }
}
