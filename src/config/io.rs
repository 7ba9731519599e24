use std::io;
use std::path::{Path, PathBuf};
use std::str;

use directories_next::ProjectDirs;
use log::info;
use serde_json;
use tokio::fs;

use crate::config::types::Config;
use crate::error::ConfigError;

// creates a path to beanctl.json in an os dependent standard directory, such
// as %AppData% on windows.
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("io", "beanctl", "beanctl").map(|dirs| {
        dirs.config_dir().join("beanctl.json")
    })
}

/// Reads and writes the config file. A missing file reads as the defaults.
#[derive(Debug, Clone)]
pub struct ConfigIO {
    path: PathBuf,
}

impl ConfigIO {
    /// `explicit_path` comes from the `--config` flag and takes precedence
    /// over the platform config directory.
    pub fn new(explicit_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match explicit_path {
            Some(path) => path,
            None => get_local_config_path().ok_or(ConfigError::NoConfigPath)?,
        };

        Ok(ConfigIO { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Config, ConfigError> {
        info!("Reading config file {}", self.path.to_string_lossy());

        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Config::default());
            },
            Err(err) => return Err(err.into()),
        };

        if content.is_empty() {
            return Ok(Config::default());
        }

        let content = str::from_utf8(&content)?;
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    pub async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        info!("Saving config file {}", self.path.to_string_lossy());

        if let Some(directory) = self.path.parent() {
            fs::create_dir_all(directory).await?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_io(dir: &tempfile::TempDir) -> ConfigIO {
        ConfigIO::new(Some(dir.path().join("beanctl.json"))).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_io = temp_config_io(&dir);

        assert_eq!(config_io.read().await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn save_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config_io = temp_config_io(&dir);

        let config = Config {
            device_name: Some("bean1".to_string()),
            device_address: None,
            scan_timeout_secs: 30,
        };
        config_io.save(&config).await.unwrap();

        assert_eq!(config_io.read().await.unwrap(), config);
    }

    #[tokio::test]
    async fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config_io = ConfigIO::new(Some(dir.path().join("nested/beanctl.json"))).unwrap();

        config_io.save(&Config::default()).await.unwrap();
        assert_eq!(config_io.read().await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn malformed_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_io = temp_config_io(&dir);
        std::fs::write(config_io.path(), "{ not json").unwrap();

        assert!(matches!(
            config_io.read().await,
            Err(ConfigError::JsonError { .. })
        ));
    }
}
