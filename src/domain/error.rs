use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of a speech recognition failure, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechErrorCode {
    /// Audio device acquisition or configuration failed.
    Audio,
    /// Microphone or speech recognition authorization is missing.
    Permissions,
    /// Recognizer backend unreachable.
    Network,
    /// Recognizer backend did not answer in time.
    NetworkTimeout,
    /// No recognizable speech.
    NoMatch,
    /// Recognizer resource is contended, or a session is already running.
    Busy,
    /// Recognizer backend failure.
    Server,
    /// No speech input before the recognizer timed out.
    SpeechTimeout,
    /// Capability not available on this platform or mode.
    Unsupported,
    /// Uncategorized recognition failure.
    RecognitionFail,
}

impl SpeechErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechErrorCode::Audio => "audio",
            SpeechErrorCode::Permissions => "permissions",
            SpeechErrorCode::Network => "network",
            SpeechErrorCode::NetworkTimeout => "network_timeout",
            SpeechErrorCode::NoMatch => "no_match",
            SpeechErrorCode::Busy => "busy",
            SpeechErrorCode::Server => "server",
            SpeechErrorCode::SpeechTimeout => "speech_timeout",
            SpeechErrorCode::Unsupported => "unsupported",
            SpeechErrorCode::RecognitionFail => "recognition_fail",
        }
    }
}

impl fmt::Display for SpeechErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload delivered to `on_error` callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechErrorResult {
    pub code: SpeechErrorCode,
    pub message: String,
}

impl SpeechErrorResult {
    pub fn new(code: SpeechErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&DomainError> for SpeechErrorResult {
    fn from(err: &DomainError) -> Self {
        let message = match err {
            DomainError::Speech { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            code: err.code(),
            message,
        }
    }
}

/// Domain-level errors for speech sessions.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("{code}: {message}")]
    Speech {
        code: SpeechErrorCode,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Audio device error: {message}")]
    AudioDevice { message: String },
}

impl DomainError {
    pub fn speech(code: SpeechErrorCode, message: impl Into<String>) -> Self {
        DomainError::Speech {
            code,
            message: message.into(),
        }
    }

    pub fn audio(message: impl Into<String>) -> Self {
        Self::speech(SpeechErrorCode::Audio, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::speech(SpeechErrorCode::Busy, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::speech(SpeechErrorCode::Unsupported, message)
    }

    pub fn permissions(message: impl Into<String>) -> Self {
        Self::speech(SpeechErrorCode::Permissions, message)
    }

    pub fn recognition_fail(message: impl Into<String>) -> Self {
        Self::speech(SpeechErrorCode::RecognitionFail, message)
    }

    /// The caller-facing kind of this error.
    pub fn code(&self) -> SpeechErrorCode {
        match self {
            DomainError::Speech { code, .. } => *code,
            DomainError::AudioDevice { .. } => SpeechErrorCode::Audio,
            DomainError::Config(_) | DomainError::Serialization(_) | DomainError::Io(_) => {
                SpeechErrorCode::RecognitionFail
            }
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
