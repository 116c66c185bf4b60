use std::sync::Arc;

use lexi_store::{DocumentStore, Snapshot, StoreError, paths};
use lexi_types::UserId;
use serde_json::{Map, Value, json};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

/// Score stored in a `users/{uid}` snapshot, 0 when absent
pub fn score_of(snapshot: &Snapshot) -> i64 {
    snapshot
        .as_ref()
        .and_then(|profile| profile.get("score"))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

/// Persisted score of one user with a locally cached copy
#[derive(Clone)]
pub struct ScoreLedger {
    store: Arc<dyn DocumentStore>,
    uid: UserId,
    cache: Arc<watch::Sender<i64>>,
    /// Held across each read-modify-write
    writing: Arc<Mutex<()>>,
}

impl ScoreLedger {
    pub fn new(store: Arc<dyn DocumentStore>, uid: UserId) -> Self {
        let (cache, _) = watch::channel(0);
        Self {
            store,
            uid,
            cache: Arc::new(cache),
            writing: Arc::new(Mutex::new(())),
        }
    }

    /// Last known value
    pub fn value(&self) -> i64 {
        *self.cache.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<i64> {
        self.cache.subscribe()
    }

    pub async fn resync(&self) -> Result<i64, StoreError> {
        let snapshot = self.store.read_once(&paths::user(&self.uid)).await?;
        let score = score_of(&snapshot);
        self.cache.send_replace(score);
        Ok(score)
    }

    /// Read the stored score, add `delta` and write it back
    ///
    /// Calls through clones of one ledger run one at a time. Not atomic
    /// across sessions: another writer between the read and the update is
    /// overwritten.
    pub async fn apply_delta(&self, delta: i64) -> Result<i64, StoreError> {
        let _turn = self.writing.lock().await;
        let path = paths::user(&self.uid);
        let current = score_of(&self.store.read_once(&path).await?);
        let next = current.saturating_add(delta);

        let mut fields = Map::new();
        fields.insert("score".to_string(), json!(next));
        self.store.update(&path, fields).await?;

        tracing::debug!("score {current} -> {next} ({delta:+})");
        self.cache.send_replace(next);
        Ok(next)
    }

    /// Mirror store changes into the cache until `cancel` fires
    pub async fn follow(&self, cancel: CancellationToken) -> Result<(), StoreError> {
        let subscription = self.store.subscribe(&paths::user(&self.uid)).await?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                snapshot = subscription.recv() => match snapshot {
                    Some(snapshot) => {
                        self.cache.send_replace(score_of(&snapshot));
                    }
                    None => break,
                },
            }
        }

        subscription.unsubscribe();
        Ok(())
    }
}
