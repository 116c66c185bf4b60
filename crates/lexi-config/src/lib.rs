use std::env;

use serde::{Deserialize, Serialize};

use self::log::LogConfig;
use self::quiz::QuizConfig;
use self::store::StoreConfig;
use self::ui::UiConfig;

pub mod log;
pub mod quiz;
pub mod store;
pub mod ui;

pub use quiz::ScoringConfig;
pub use store::StoreBackend;

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub quiz: QuizConfig,
    pub ui: UiConfig,
    pub log: LogConfig,

    /// Per-request timeout for remote backends
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            quiz: QuizConfig::default(),
            ui: UiConfig::default(),
            log: LogConfig::default(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        Self::default().with_env()
    }

    pub fn with_env(mut self) -> Self {
        self.store.apply_env();

        if let Some(timeout) = env::var("LEXI_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout_seconds = timeout;
        }

        self
    }
}
