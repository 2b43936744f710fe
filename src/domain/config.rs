use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::options::RecognitionOptions;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between audio device acquisition and recognizer start, letting
    /// the hardware finish reconfiguring. Cancel during the delay abandons
    /// the start before any recognizer task exists.
    pub settle_delay_ms: u64,
    /// Locale used when a start passes an empty one. Empty means the
    /// recognizer's own default.
    pub default_locale: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 250,
            default_locale: String::new(),
        }
    }
}

impl SessionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Microphone capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioInputConfig {
    /// Frames per capture block delivered to the level meter and recognizer.
    pub buffer_frames: u32,
    /// Input device name, or the system default if unset.
    pub device_id: Option<String>,
}

impl Default for AudioInputConfig {
    fn default() -> Self {
        Self {
            buffer_frames: 1024,
            device_id: None,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub audio: AudioInputConfig,
    /// Options applied when a start passes none.
    pub recognition: RecognitionOptions,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
