mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::{Path, PathBuf};
use tracing::debug;

const ANON_KEY_ENV: &str = "LIFEPLAN_ANON_KEY";
const MIN_TEXT_WIDTH: usize = 20;
const MIN_TEXT_HEIGHT: usize = 10;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            recent_limit: default_recent_limit(),
            remote: None,
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load config, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env();
            Ok(config)
        }
    }

    fn apply_env(&mut self) {
        if let (Some(remote), Ok(key)) = (self.remote.as_mut(), std::env::var(ANON_KEY_ENV)) {
            if !key.is_empty() {
                remote.anon_key = key;
            }
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_limit == 0 {
            return Err(ConfigError::ZeroRecentLimit);
        }

        if let Some(remote) = &self.remote {
            if remote.url.trim().is_empty() {
                return Err(ConfigError::EmptyRemoteUrl);
            }
        }

        let export = &self.export;
        let text_width = export.page_width.saturating_sub(export.margin * 2);
        let text_height = export.page_height.saturating_sub(export.margin * 2);
        if text_width < MIN_TEXT_WIDTH || text_height < MIN_TEXT_HEIGHT {
            return Err(ConfigError::PageTooSmall {
                width: export.page_width,
                height: export.page_height,
                margin: export.margin,
            });
        }

        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        self.data_dir.clone().ok_or(ConfigError::NoDataDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = serde_yaml::from_str("data_dir: /tmp/lifeplan\n").unwrap();
        assert_eq!(config.recent_limit, 5);
        assert!(config.remote.is_none());
        assert_eq!(config.export.page_width, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_remote_defaults() {
        let yaml = r#"
remote:
  url: https://example.supabase.co
  anon_key: public-key
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let remote = config.remote.unwrap();
        assert_eq!(remote.table, "plans");
        assert_eq!(remote.timeout_sec, 15);
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let config = Config {
            recent_limit: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroRecentLimit)
        ));
    }

    #[test]
    fn test_validate_rejects_tiny_page() {
        let config = Config {
            export: ExportConfig {
                page_width: 30,
                page_height: 60,
                margin: 10,
            },
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PageTooSmall { .. })
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.recent_limit, 5);
    }
}
