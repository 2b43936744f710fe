use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use super::manager::SessionManager;
use crate::adapters::{CpalAudioInput, SharedAudioSession, TomlConfigStore};
use crate::domain::{AppConfig, DomainError};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, SpeechEngine};

/// Wires configuration, logging, the desktop audio adapters and a
/// [`SessionManager`] around a caller-supplied recognizer.
pub struct SpeechController {
    config: RwLock<AppConfig>,
    config_store: TomlConfigStore,
    manager: SessionManager,
    _log_guard: Option<WorkerGuard>,
}

impl SpeechController {
    /// Initialize from the configuration in the platform data directory.
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Result<Self, DomainError> {
        Self::with_store(TomlConfigStore::new()?, engine)
    }

    pub fn with_store(
        config_store: TomlConfigStore,
        engine: Arc<dyn SpeechEngine>,
    ) -> Result<Self, DomainError> {
        let config = config_store.load()?;

        let log_guard = init_logging(&config_store.logs_dir(), &config.logging)?;
        info!("Speech session service starting up");

        let audio_input = Arc::new(CpalAudioInput::with_config(config.audio.clone())?);
        let manager =
            SessionManager::new(engine, SharedAudioSession::global(), audio_input, &config);

        info!(
            settle_delay_ms = config.session.settle_delay_ms,
            default_locale = %config.session.default_locale,
            "SpeechController initialized"
        );

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            manager,
            _log_guard: log_guard,
        })
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Persist `config` and apply it to subsequent sessions.
    ///
    /// Audio capture settings take effect on the next launch.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        self.config_store.save(&config)?;
        self.manager.apply_config(&config);
        *self.config.write() = config;

        info!("Configuration updated");
        Ok(())
    }

    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }
}
