//! Session lifecycle coordinator for continuous speech recognition.
//!
//! A [`SessionManager`] admits one recognition session at a time, acquires
//! the shared audio session for it, feeds microphone audio to a
//! [`SpeechEngine`] and reports results through caller callbacks. Every
//! session releases what it acquired exactly once, however it ends.

#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use app::{RecognitionSession, SessionManager, SpeechController};
pub use domain::{
    AppConfig, AudioBuffer, DomainError, PermissionStatus, RecognitionOptions, SessionEvent,
    SpeechCallbacks, SpeechErrorCode, SpeechErrorResult, Transcript, TranscriptionCallbacks,
    TranscriptionSegment,
};
pub use ports::{EngineEvent, EventSink, RecognitionTask, SpeechEngine};
