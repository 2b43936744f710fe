use std::path::Path;

use async_trait::async_trait;

use super::sink::EventSink;
use crate::domain::{AudioBuffer, DomainError, PermissionStatus, RecognitionOptions};

/// An open recognition stream or task.
///
/// Dropping the task must release any recognizer resources it holds.
pub trait RecognitionTask: Send {
    /// Feed captured audio to a live stream. File tasks ignore it.
    fn append(&mut self, buffer: &AudioBuffer);

    /// Stop accepting input and deliver a final result from what was captured.
    fn finish(&mut self);

    /// Abort immediately; no further events need to be delivered.
    fn cancel(&mut self);
}

/// Port for the platform speech recognizer.
///
/// Implementations report results through the [`EventSink`] they are given,
/// from any thread. Option fields they do not support are ignored.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Prompt for microphone and speech recognition authorization.
    async fn request_permission(&self) -> PermissionStatus;

    /// Current authorization, without prompting.
    fn authorization_status(&self) -> PermissionStatus;

    /// Whether recognition is available on this device right now.
    fn is_available(&self) -> bool;

    /// Whether this platform can transcribe audio files.
    fn supports_file_transcription(&self) -> bool;

    /// Open a streaming recognition request fed by [`RecognitionTask::append`].
    ///
    /// An empty locale selects the recognizer's default.
    fn open_live_stream(
        &self,
        locale: &str,
        options: &RecognitionOptions,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionTask>, DomainError>;

    /// Create a recognition task over a bounded audio file.
    fn open_file_transcription(
        &self,
        path: &Path,
        locale: &str,
        options: &RecognitionOptions,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionTask>, DomainError>;
}
