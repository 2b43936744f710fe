pub mod audio;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod level;
pub mod options;
pub mod session;
pub mod transcription;

pub use audio::{AudioCategory, AudioPort, AudioRoute, CategoryOptions};
pub use callbacks::{SessionCallbacks, SpeechCallbacks, TranscriptionCallbacks};
pub use config::{AppConfig, AudioInputConfig, LoggingConfig, SessionConfig};
pub use error::{DomainError, SpeechErrorCode, SpeechErrorResult};
pub use level::LevelMeter;
pub use options::{PermissionStatus, RecognitionOptions, TaskHint};
pub use session::{AtomicSessionPhase, SessionEvent, SessionId, SessionMode, SessionPhase};
pub use transcription::{AudioBuffer, Transcript, TranscriptionSegment};
