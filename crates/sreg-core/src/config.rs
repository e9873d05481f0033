use std::path::Path;

use serde::{Deserialize, Serialize};

use sreg_gate::GateConfig;
use sreg_handlers::HandlerConfig;
use sreg_log::LogConfig;
use sreg_view::MaterializerConfig;

use crate::error::ConfigError;

/// Everything the [`Registry`](crate::Registry) needs to assemble itself.
///
/// Every section is optional in TOML; missing sections take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub log: LogConfig,
    pub materializer: MaterializerConfig,
    pub validation: GateConfig,
    pub handlers: HandlerConfig,
}

impl RegistryConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
