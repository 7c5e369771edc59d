//! Host configuration file.
//!
//! A single JSON document with a `logging` section (see
//! [`stoa_log::config::LoggingConfig`]) and a `seed_data` section (see
//! [`stoa_seed::SeedState`]). Both sections are optional.
//!
//! ```json
//! {
//!   "logging": { "folder": "/var/log/stoa", "database_url": "mongodb://localhost/stoa" },
//!   "seed_data": { "seed": true, "iterator": 1, "genesis_timestamp": 1700000000 }
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use stoa_log::config::LoggingConfig;
use stoa_seed::SeedState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub seed_data: SeedState,
}

/// Load and parse a JSON config file.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "logging": { "folder": "/tmp/stoa-logs", "environment": "development" },
                "seed_data": { "seed": true, "iterator": 2, "genesis_timestamp": 1700000000 }
            }"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.logging.folder.as_deref(), Some(Path::new("/tmp/stoa-logs")));
        assert!(config.seed_data.seed);
        assert_eq!(config.seed_data.iterator, 2);
        assert_eq!(config.seed_data.genesis_timestamp, 1_700_000_000);
    }

    #[test]
    fn missing_sections_default() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.seed_data.seed);
        assert!(config.logging.database_url.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/stoa.json")).is_err());
    }
}
