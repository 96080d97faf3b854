use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};
use crate::location::Location;

/// repository configuration stored in the `config` file
///
/// one recognized section with one mandatory key: `core.url`, the
/// object store location (absolute local path or `host:path`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub core: Core,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Core {
    pub url: String,
}

impl Config {
    /// create a config pointing at the given object store
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            core: Core { url: url.into() },
        }
    }

    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// typed object store location parsed from `core.url`
    pub fn store_location(&self) -> Location {
        Location::parse(&self.core.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");

        let config = Config::new("/var/vault/.pit/objects");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.core.url, "/var/vault/.pit/objects");
    }

    #[test]
    fn test_config_parse_minimal() {
        let toml_str = r#"
[core]
url = "host:/srv/pit/objects"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.store_location().is_remote());
    }

    #[test]
    fn test_config_missing_url() {
        let result: std::result::Result<Config, _> = toml::from_str("[core]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::load(&dir.path().join("config"));
        assert!(matches!(result, Err(crate::Error::Io { .. })));
    }
}
