pub mod controller;
pub mod guard;
pub mod manager;
pub mod session;

pub use controller::SpeechController;
pub use guard::AudioResourceGuard;
pub use manager::SessionManager;
pub use session::{
    RecognitionSession, SessionDeps, SessionRequest, StartOutcome, TeardownHook,
};
