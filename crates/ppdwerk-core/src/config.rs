// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Agent configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PpdError, Result};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "PPDWERK_CONFIG";

/// Settings for the query agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Directory for decompressed temporary copies (None = system temp dir).
    pub temp_dir: Option<PathBuf>,
    /// Keep built documents between requests.
    pub cache_enabled: bool,
    /// Maximum number of cached documents.
    pub cache_capacity: usize,
    /// Maximum length in bytes of the retained last-error message.
    pub last_error_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            cache_enabled: true,
            cache_capacity: 32,
            last_error_capacity: 1023,
        }
    }
}

impl AgentConfig {
    /// Read a configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PpdError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PpdError::Config(format!("invalid {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `PPDWERK_CONFIG`, or fall back to defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.cache_enabled && self.cache_capacity == 0 {
            return Err(PpdError::Config(
                "cache_capacity must be at least 1 when the cache is enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"cache_capacity": 4}"#).unwrap();
        assert_eq!(config.cache_capacity, 4);
        assert!(config.cache_enabled);
        assert_eq!(config.last_error_capacity, 1023);
        assert_eq!(config.temp_dir, None);
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = AgentConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PpdError::Config(_))));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = AgentConfig::load("/nonexistent/ppdwerk.json").unwrap_err();
        assert_eq!(err.kind(), "Config");
    }
}
