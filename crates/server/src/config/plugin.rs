use std::time::Duration;

use serde::Deserialize;

/// Settings for the plugin serve loop.
#[derive(Debug, Deserialize)]
pub struct PluginConfig {
    /// Deadline applied around every resource operation. Must be at least 1.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

impl PluginConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

fn default_operation_timeout() -> u64 {
    30
}
