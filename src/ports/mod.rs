pub mod audio;
pub mod config;
pub mod recognizer;
pub mod sink;

pub use audio::{AudioInput, AudioSessionPort};
pub use config::ConfigStore;
pub use recognizer::{RecognitionTask, SpeechEngine};
pub use sink::{AudioSink, EngineEvent, EventSink};
