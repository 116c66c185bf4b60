use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process document tree, lost on exit
    #[default]
    Memory,
    /// Realtime database REST endpoint
    Rest,
}

impl StoreBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Some(StoreBackend::Memory),
            "rest" => Some(StoreBackend::Rest),
            _ => None,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database root, e.g. https://<project>.firebaseio.com
    pub url: String,
    /// Web API key for the identity endpoints
    pub api_key: String,
    pub identity_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            api_key: String::new(),
            identity_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl StoreConfig {
    /// Apply `LEXI_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Some(backend) = env::var("LEXI_STORE_BACKEND")
            .ok()
            .and_then(|v| StoreBackend::parse(&v))
        {
            self.backend = backend;
        }
        if let Ok(url) = env::var("LEXI_STORE_URL") {
            self.url = url;
        }
        if let Ok(key) = env::var("LEXI_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = env::var("LEXI_IDENTITY_URL") {
            self.identity_url = url;
        }
        if let Some(ms) = env::var("LEXI_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.poll_interval_ms = ms;
        }
    }
}
