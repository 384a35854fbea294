mod logging;
mod plugin;
mod redis;

#[cfg(test)]
mod tests;

use std::path::Path;

use serde::Deserialize;

pub use logging::*;
pub use plugin::*;
pub use redis::*;

use crate::error::ServerError;

/// Top-level configuration for the provider binary, loaded from a TOML file.
///
/// Every section is optional. The Redis server URL is not part of this file;
/// it arrives through the provider's `redis_url` setting.
#[derive(Debug, Default, Deserialize)]
pub struct ServeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub plugin: PluginConfig,
    #[serde(default)]
    pub redis: RedisPoolConfig,
}

impl ServeConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the file cannot be read and
    /// [`ServerError::Config`] if it is not valid TOML for this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let contents = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] on malformed input or out-of-range
    /// values.
    pub fn parse(contents: &str) -> Result<Self, ServerError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.plugin.operation_timeout_seconds == 0 {
            return Err(ServerError::Config(
                "plugin.operation_timeout_seconds must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
