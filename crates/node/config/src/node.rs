//! Top-level node configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AggregatorConfig, ConfigError, PartyConfig};

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Aggregator section.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Party section.
    #[serde(default)]
    pub party: PartyConfig,
}

impl NodeConfig {
    /// Parse TOML.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&contents)
    }

    /// Load `path` if given, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Write as TOML to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggregator.validate()?;
        self.party.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = NodeConfig::from_toml("").expect("parse");
        assert_eq!(config, NodeConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sections() {
        let config = NodeConfig::from_toml(
            r#"
            [aggregator]
            listen_addr = "0.0.0.0:9000"
            epoch_duration_secs = 10

            [party]
            id = "p1"
            aggregator_url = "http://10.0.0.1:9000/"
            "#,
        )
        .expect("parse");
        assert_eq!(config.aggregator.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.aggregator.epoch_duration_secs, 10);
        assert_eq!(config.party.party_id(), "p1");
        assert_eq!(config.party.aggregator_url, "http://10.0.0.1:9000/");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigag.toml");
        let mut config = NodeConfig::default();
        config.aggregator.threshold_factor = 3.0;
        config.party.id = Some("p9".into());
        config.save(&path).unwrap();

        assert_eq!(NodeConfig::load(&path).unwrap(), config);
        assert_eq!(NodeConfig::load_or_default(Some(&path)).unwrap(), config);
        assert_eq!(NodeConfig::load_or_default(None).unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = NodeConfig::load(Path::new("/nonexistent/sigag.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = NodeConfig::from_toml("[aggregator\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
