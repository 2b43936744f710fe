pub mod audio_cpal;
pub mod audio_session;
pub mod config_store;

pub use audio_cpal::CpalAudioInput;
pub use audio_session::SharedAudioSession;
pub use config_store::TomlConfigStore;
