use serde_json::{Map, Value};

mod identity;
mod memory;
mod rest;
mod subscription;

pub mod paths;

pub use identity::{AuthError, Identity, IdentityProvider, MemoryIdentity, RestIdentity};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use subscription::Subscription;

/// Latest value at a path, `None` when nothing is stored there
pub type Snapshot = Option<Value>;

/// Remote keyed document tree
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stream of snapshots at `path`: the current value first, then one per change
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;

    /// Append `value` under a generated key and return that key
    async fn create_child(&self, path: &str, value: Value) -> Result<String, StoreError>;

    async fn read_once(&self, path: &str) -> Result<Snapshot, StoreError>;

    /// Merge `fields` into the document at `path`
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Replace the document at `path`
    async fn overwrite(&self, path: &str, value: Value) -> Result<(), StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Credential for subsequent requests, cleared with `None`
    fn set_auth_token(&self, _token: Option<String>) {}
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Request failed: HTTP {0}")]
    Http(u16),
}

/// Split a slash-separated path into keys
pub(crate) fn split_path(path: &str) -> Result<Vec<String>, StoreError> {
    let keys: Vec<String> = path
        .split('/')
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    let forbidden = ['.', '#', '$', '[', ']'];
    if keys.is_empty() || keys.iter().any(|k| k.contains(forbidden)) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    Ok(keys)
}
