use std::collections::VecDeque;

use crate::store::StoreResponse;
use crate::store::StoreWatcher;
use crate::StoreResult;

/// Replays a fixed list of results, then blocks forever like an idle store
pub(crate) struct ScriptedWatcher {
    script: VecDeque<StoreResult<StoreResponse>>,
}

impl ScriptedWatcher {
    pub(crate) fn new(script: Vec<StoreResult<StoreResponse>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub(crate) fn boxed(script: Vec<StoreResult<StoreResponse>>) -> Box<dyn StoreWatcher> {
        Box::new(Self::new(script))
    }
}

#[async_trait::async_trait]
impl StoreWatcher for ScriptedWatcher {
    async fn next(&mut self) -> StoreResult<StoreResponse> {
        match self.script.pop_front() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}
