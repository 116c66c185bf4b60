use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use kanal::AsyncSender;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{DocumentStore, Snapshot, StoreError, Subscription, split_path};

/// In-process document tree with live subscriptions
pub struct MemoryStore {
    inner: Mutex<Inner>,
    available: AtomicBool,
    latency_ms: AtomicU64,
}

#[derive(Default)]
struct Inner {
    root: Map<String, Value>,
    watchers: Vec<Watcher>,
}

struct Watcher {
    path: Vec<String>,
    tx: AsyncSender<Snapshot>,
    cancel: CancellationToken,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Simulate losing (or regaining) the connection
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delay every following operation by `latency`
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of live subscriptions
    pub async fn watcher_count(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.watchers.retain(|w| !w.cancel.is_cancelled());
        inner.watchers.len()
    }

    async fn ready(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store offline".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn get(&self, keys: &[String]) -> Snapshot {
        let (first, rest) = keys.split_first()?;
        let mut node = self.root.get(first)?;
        for key in rest {
            node = node.as_object()?.get(key)?;
        }
        Some(node.clone())
    }

    fn set(&mut self, keys: &[String], value: Value) {
        let value = prune(value);
        if value.is_null() {
            self.remove(keys);
            return;
        }

        let Some((last, parents)) = keys.split_last() else {
            return;
        };

        let mut node = &mut self.root;
        for key in parents {
            let child = node
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            let Value::Object(map) = child else {
                return;
            };
            node = map;
        }
        node.insert(last.clone(), value);
    }

    fn remove(&mut self, keys: &[String]) {
        remove_in(&mut self.root, keys);
    }

    /// Push the current snapshot to every watcher related to `changed`
    async fn notify(&mut self, changed: &[String]) {
        self.watchers.retain(|w| !w.cancel.is_cancelled());

        let mut dead = Vec::new();
        for (idx, watcher) in self.watchers.iter().enumerate() {
            if !related(&watcher.path, changed) {
                continue;
            }
            let snapshot = self.get(&watcher.path);
            if watcher.tx.send(snapshot).await.is_err() {
                dead.push(idx);
            }
        }

        for idx in dead.into_iter().rev() {
            tracing::debug!("dropping closed watcher on {:?}", self.watchers[idx].path);
            self.watchers.remove(idx);
        }
    }
}

/// Remove the value at `keys`, pruning parents left empty
fn remove_in(map: &mut Map<String, Value>, keys: &[String]) -> bool {
    let Some((first, rest)) = keys.split_first() else {
        return map.is_empty();
    };

    if rest.is_empty() {
        map.remove(first);
    } else if let Some(Value::Object(child)) = map.get_mut(first)
        && remove_in(child, rest)
    {
        map.remove(first);
    }

    map.is_empty()
}

/// Drop nulls and empty objects, which read back as absent
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if pruned.is_empty() {
                Value::Null
            } else {
                Value::Object(pruned)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(prune).collect()),
        other => other,
    }
}

/// A watcher sees a change at, above or below its path
fn related(watched: &[String], changed: &[String]) -> bool {
    watched.iter().zip(changed).all(|(a, b)| a == b)
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        self.ready().await?;
        let keys = split_path(path)?;

        let (tx, rx) = kanal::unbounded_async();
        let cancel = CancellationToken::new();

        let mut inner = self.inner.lock().await;
        let snapshot = inner.get(&keys);
        // Receiver is alive, an unbounded send cannot fail here
        let _ = tx.send(snapshot).await;
        inner.watchers.push(Watcher {
            path: keys,
            tx,
            cancel: cancel.clone(),
        });

        tracing::debug!("subscribed to {path}");
        Ok(Subscription::new(rx, cancel))
    }

    async fn create_child(&self, path: &str, value: Value) -> Result<String, StoreError> {
        self.ready().await?;
        let mut keys = split_path(path)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        keys.push(id.clone());

        let mut inner = self.inner.lock().await;
        inner.set(&keys, value);
        inner.notify(&keys).await;

        Ok(id)
    }

    async fn read_once(&self, path: &str) -> Result<Snapshot, StoreError> {
        self.ready().await?;
        let keys = split_path(path)?;

        let inner = self.inner.lock().await;
        Ok(inner.get(&keys))
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.ready().await?;
        let keys = split_path(path)?;

        let changes = fields
            .into_iter()
            .map(|(field, value)| {
                let mut child = keys.clone();
                child.extend(split_path(&field)?);
                Ok((child, value))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut inner = self.inner.lock().await;
        for (child, value) in changes {
            inner.set(&child, value);
        }
        inner.notify(&keys).await;

        Ok(())
    }

    async fn overwrite(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.ready().await?;
        let keys = split_path(path)?;

        let mut inner = self.inner.lock().await;
        inner.set(&keys, value);
        inner.notify(&keys).await;

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.ready().await?;
        let keys = split_path(path)?;

        let mut inner = self.inner.lock().await;
        inner.remove(&keys);
        inner.notify(&keys).await;

        Ok(())
    }
}
