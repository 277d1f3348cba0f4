//! ScriptedDataSource - 応答を台本どおりに返す DataSource（テスト・デモ用）
//!
//! # 使い方
//! - `reply()`: 即座に返す応答を積む
//! - `defer()`: 後から `resolve()` する応答を積む（解決順序をテストで制御できる）
//! - 台本が尽きた id には `Ok(None)`（代替なし）を返す

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::{Entity, EntityId, FetchError, RailDescriptor};
use crate::ports::DataSource;

enum Reply<T> {
    Ready(Result<T, FetchError>),
    Deferred(oneshot::Receiver<Result<T, FetchError>>),
}

impl<T> Reply<T> {
    async fn settle(self) -> Result<T, FetchError> {
        match self {
            Reply::Ready(r) => r,
            Reply::Deferred(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Transport("reply dropped".to_string()))),
        }
    }
}

/// Test-side handle of a deferred reply.
#[must_use = "the fetch stays pending until resolved"]
pub struct Deferred<T> {
    tx: oneshot::Sender<Result<T, FetchError>>,
}

impl<T> Deferred<T> {
    pub fn resolve(self, result: Result<T, FetchError>) {
        // ignore send error: the fetch may have been cancelled already
        let _ = self.tx.send(result);
    }
}

#[derive(Default)]
struct Script {
    replacements: HashMap<EntityId, VecDeque<Reply<Option<Entity>>>>,
    rails: VecDeque<Reply<Vec<Entity>>>,
    calls: HashMap<EntityId, usize>,
    rail_calls: usize,
}

#[derive(Default)]
pub struct ScriptedDataSource {
    script: Mutex<Script>,
}

impl ScriptedDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reply(&self, source: impl Into<EntityId>, result: Result<Option<Entity>, FetchError>) {
        self.lock()
            .replacements
            .entry(source.into())
            .or_default()
            .push_back(Reply::Ready(result));
    }

    pub fn suggest(&self, source: impl Into<EntityId>, substitute: Entity) {
        self.reply(source, Ok(Some(substitute)));
    }

    pub fn fail(&self, source: impl Into<EntityId>, error: FetchError) {
        self.reply(source, Err(error));
    }

    pub fn defer(&self, source: impl Into<EntityId>) -> Deferred<Option<Entity>> {
        let (tx, rx) = oneshot::channel();
        self.lock()
            .replacements
            .entry(source.into())
            .or_default()
            .push_back(Reply::Deferred(rx));
        Deferred { tx }
    }

    pub fn reply_rail(&self, result: Result<Vec<Entity>, FetchError>) {
        self.lock().rails.push_back(Reply::Ready(result));
    }

    pub fn defer_rail(&self) -> Deferred<Vec<Entity>> {
        let (tx, rx) = oneshot::channel();
        self.lock().rails.push_back(Reply::Deferred(rx));
        Deferred { tx }
    }

    /// How many times `fetch_replacement` was called for `source`.
    pub fn calls(&self, source: &EntityId) -> usize {
        self.lock().calls.get(source).copied().unwrap_or(0)
    }

    pub fn rail_calls(&self) -> usize {
        self.lock().rail_calls
    }
}

#[async_trait]
impl DataSource for ScriptedDataSource {
    async fn fetch_replacement(&self, source_id: &EntityId) -> Result<Option<Entity>, FetchError> {
        // take the reply out before awaiting; never hold the lock across await
        let reply = {
            let mut script = self.lock();
            *script.calls.entry(source_id.clone()).or_default() += 1;
            script
                .replacements
                .get_mut(source_id)
                .and_then(VecDeque::pop_front)
        };
        match reply {
            Some(reply) => reply.settle().await,
            None => Ok(None),
        }
    }

    async fn fetch_rail(&self, _rail: &RailDescriptor) -> Result<Vec<Entity>, FetchError> {
        let reply = {
            let mut script = self.lock();
            script.rail_calls += 1;
            script.rails.pop_front()
        };
        match reply {
            Some(reply) => reply.settle().await,
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_are_served_in_order_then_empty() {
        let src = ScriptedDataSource::new();
        let a = EntityId::new("a");
        src.suggest("a", Entity::new("a1", json!({})));
        src.fail("a", FetchError::Timeout);

        let first = src.fetch_replacement(&a).await.unwrap();
        assert_eq!(first.map(|e| e.id), Some(EntityId::new("a1")));
        assert_eq!(src.fetch_replacement(&a).await, Err(FetchError::Timeout));
        assert_eq!(src.fetch_replacement(&a).await, Ok(None));
        assert_eq!(src.calls(&a), 3);
    }

    #[tokio::test]
    async fn deferred_reply_waits_for_resolve() {
        let src = std::sync::Arc::new(ScriptedDataSource::new());
        let pending = src.defer("a");

        let fetch = tokio::spawn({
            let src = src.clone();
            async move { src.fetch_replacement(&EntityId::new("a")).await }
        });
        tokio::task::yield_now().await;
        assert!(!fetch.is_finished());

        pending.resolve(Ok(Some(Entity::new("a2", json!({})))));
        let got = fetch.await.unwrap().unwrap();
        assert_eq!(got.map(|e| e.id), Some(EntityId::new("a2")));
    }
}
