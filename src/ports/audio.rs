use async_trait::async_trait;

use super::sink::AudioSink;
use crate::domain::{AudioCategory, AudioRoute, CategoryOptions, DomainError};

/// Port for the process-wide audio session (category, activation, routing).
///
/// The device is a shared singleton; only `AudioResourceGuard` calls this.
pub trait AudioSessionPort: Send + Sync {
    /// Current category.
    fn category(&self) -> AudioCategory;

    fn set_category(
        &self,
        category: AudioCategory,
        options: CategoryOptions,
    ) -> Result<(), DomainError>;

    fn set_active(&self, active: bool) -> Result<(), DomainError>;

    /// Current outputs and available inputs.
    fn current_route(&self) -> AudioRoute;
}

/// Port for microphone capture.
///
/// Implementations deliver blocks through the [`AudioSink`] from their own
/// capture context.
#[async_trait]
pub trait AudioInput: Send + Sync {
    /// Start capturing into `sink`.
    ///
    /// Returns once the device is delivering buffers, or an error if it
    /// could not be started.
    async fn start(&self, sink: AudioSink) -> Result<(), DomainError>;

    /// Stop capturing. Stopping an idle input is a no-op.
    async fn stop(&self);
}
