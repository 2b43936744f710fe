use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Persistent storage for [`AppConfig`].
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration, writing defaults first if none exists.
    fn load(&self) -> Result<AppConfig, DomainError>;

    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    fn config_path(&self) -> PathBuf;

    /// Root directory for everything the service persists.
    fn data_dir(&self) -> PathBuf;

    fn logs_dir(&self) -> PathBuf;
}
