use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::{AppConfig, DomainError};
use crate::ports::ConfigStore;

const APP_DIR: &str = "SpeechSession";
const CONFIG_FILE: &str = "config.toml";

/// TOML configuration persisted under the OS application data directory.
pub struct TomlConfigStore {
    data_dir: PathBuf,
}

impl TomlConfigStore {
    /// Store rooted at the platform default location.
    /// - macOS: ~/Library/Application Support/SpeechSession/
    /// - Windows: %APPDATA%\SpeechSession\
    /// - Linux: ~/.config/SpeechSession/
    pub fn new() -> Result<Self, DomainError> {
        Self::with_data_dir(default_data_dir()?)
    }

    /// Store rooted at `data_dir`, created if missing.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        info!(data_dir = ?data_dir, "ConfigStore initialized");
        Ok(Self { data_dir })
    }
}

fn default_data_dir() -> Result<PathBuf, DomainError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::config_dir();

    base.map(|p| p.join(APP_DIR)).ok_or_else(|| {
        DomainError::Config("Could not find application data directory".to_string())
    })
}

/// Logs live beside the config on macOS and under local data elsewhere.
fn logs_dir_for(data_dir: &Path) -> PathBuf {
    #[cfg(target_os = "macos")]
    let local = None::<PathBuf>;
    #[cfg(target_os = "windows")]
    let local = dirs::data_local_dir();
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let local = dirs::data_dir();

    local
        .map(|p| p.join(APP_DIR).join("logs"))
        .unwrap_or_else(|| data_dir.join("logs"))
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            return Ok(config);
        }

        debug!(path = ?config_path, "Loading configuration");
        let content = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&content)?;
        info!(
            path = ?config_path,
            settle_delay_ms = config.session.settle_delay_ms,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn save(&self, config: &AppConfig) -> Result<(), DomainError> {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&config_path, toml::to_string_pretty(config)?)?;
        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        logs_dir_for(&self.data_dir)
    }
}
