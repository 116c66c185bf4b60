use serde::{Deserialize, Serialize};

fn default_message_timeout_ms() -> u64 {
    3000
}

fn default_notice_timeout_ms() -> u64 {
    2000
}

fn default_prompt() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long validation errors stay visible
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
    /// How long success notices stay visible
    #[serde(default = "default_notice_timeout_ms")]
    pub notice_timeout_ms: u64,
    #[serde(default = "default_prompt")]
    pub prompt: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            message_timeout_ms: default_message_timeout_ms(),
            notice_timeout_ms: default_notice_timeout_ms(),
            prompt: default_prompt(),
        }
    }
}
