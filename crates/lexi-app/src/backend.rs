use std::sync::Arc;
use std::time::Duration;

use lexi_config::{Config, StoreBackend};
use lexi_store::{
    DocumentStore, IdentityProvider, MemoryIdentity, MemoryStore, RestIdentity, RestStore,
};

/// Store and identity provider selected by configuration
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Backends {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.store.backend {
            StoreBackend::Memory => Ok(Self::memory()),
            StoreBackend::Rest => {
                if config.store.url.is_empty() {
                    anyhow::bail!("store.url (or LEXI_STORE_URL) is required for the rest backend");
                }

                let timeout = Duration::from_secs(config.timeout_seconds);
                let store = RestStore::new(
                    config.store.url.clone(),
                    timeout,
                    Duration::from_millis(config.store.poll_interval_ms),
                )?;
                let identity = RestIdentity::new(
                    config.store.identity_url.clone(),
                    config.store.api_key.clone(),
                    timeout,
                )?;

                Ok(Self {
                    store: Arc::new(store),
                    identity: Arc::new(identity),
                })
            }
        }
    }

    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            identity: Arc::new(MemoryIdentity::new()),
        }
    }
}
