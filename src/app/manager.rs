use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::session::{
    RecognitionSession, SessionDeps, SessionRequest, StartOutcome, TeardownHook,
};
use crate::domain::{
    AppConfig, DomainError, PermissionStatus, RecognitionOptions, SessionConfig, SessionEvent,
    SessionId, SpeechCallbacks, TranscriptionCallbacks,
};
use crate::ports::{AudioInput, AudioSessionPort, SpeechEngine};

const EVENT_CAPACITY: usize = 64;

type Slot = Arc<Mutex<Option<RecognitionSession>>>;

/// Entry point for callers: admits at most one recognition session at a time.
pub struct SessionManager {
    engine: Arc<dyn SpeechEngine>,
    audio_session: Arc<dyn AudioSessionPort>,
    audio_input: Arc<dyn AudioInput>,
    config: RwLock<SessionConfig>,
    default_options: RwLock<RecognitionOptions>,
    slot: Slot,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        audio_session: Arc<dyn AudioSessionPort>,
        audio_input: Arc<dyn AudioInput>,
        config: &AppConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            audio_session,
            audio_input,
            config: RwLock::new(config.session.clone()),
            default_options: RwLock::new(config.recognition.clone()),
            slot: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Replace the session settings and default options. Applies to the
    /// next start.
    pub fn apply_config(&self, config: &AppConfig) {
        *self.config.write() = config.session.clone();
        *self.default_options.write() = config.recognition.clone();
        debug!(
            settle_delay_ms = config.session.settle_delay_ms,
            default_locale = %config.session.default_locale,
            "Session settings updated"
        );
    }

    /// Prompt for speech recognition permission if needed.
    pub async fn request_permission(&self) -> PermissionStatus {
        let status = self.engine.request_permission().await;
        info!(status = ?status, "Speech recognition permission requested");
        status
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    /// Whether a session currently holds the slot.
    pub fn is_active(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn current_session(&self) -> Option<RecognitionSession> {
        self.slot.lock().clone()
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start live recognition from the microphone.
    ///
    /// Resolves once the recognizer is accepting audio, or with the reason
    /// it could not start. Results then arrive through `callbacks`.
    pub async fn start_listening(
        &self,
        locale: &str,
        callbacks: SpeechCallbacks,
        options: Option<RecognitionOptions>,
    ) -> Result<(), DomainError> {
        let request = SessionRequest::Live {
            locale: self.resolve_locale(locale),
            options: options.unwrap_or_else(|| self.default_options.read().clone()),
            callbacks,
        };
        self.start(request).await
    }

    /// Start transcribing a pre-recorded audio file.
    pub async fn start_transcription(
        &self,
        path: impl Into<PathBuf>,
        locale: &str,
        callbacks: TranscriptionCallbacks,
        options: Option<RecognitionOptions>,
    ) -> Result<(), DomainError> {
        let request = SessionRequest::File {
            path: path.into(),
            locale: self.resolve_locale(locale),
            options: options.unwrap_or_else(|| self.default_options.read().clone()),
            callbacks,
        };
        self.start(request).await
    }

    /// Ask the active session for its final result. No-op when idle.
    ///
    /// Resolves once the recognizer has been asked to finish; the session
    /// stays active until its final result or an error arrives.
    pub async fn stop(&self) -> Result<(), DomainError> {
        match self.current_session() {
            Some(session) => {
                info!(session = %session.id(), "Stopping session");
                session.finish().await;
            }
            None => debug!("Stop requested with no active session"),
        }
        Ok(())
    }

    /// Abort the active session. No-op when idle.
    ///
    /// Resolves after teardown, when the slot is free for the next start.
    pub async fn cancel(&self) -> Result<(), DomainError> {
        match self.current_session() {
            Some(session) => {
                info!(session = %session.id(), "Cancelling session");
                session.cancel().await;
            }
            None => debug!("Cancel requested with no active session"),
        }
        Ok(())
    }

    async fn start(&self, request: SessionRequest) -> Result<(), DomainError> {
        self.ensure_authorized().await?;

        let mode = request.mode();
        let outcome = self.admit(request)?;
        let result = outcome.await.unwrap_or_else(|_| {
            Err(DomainError::recognition_fail(
                "Session ended without reporting a start outcome",
            ))
        });

        match &result {
            Ok(()) => info!(mode = ?mode, "Session started"),
            Err(e) => warn!(mode = ?mode, error = %e, "Session start failed"),
        }
        result
    }

    /// Check the slot and fill it in one step.
    fn admit(&self, request: SessionRequest) -> Result<StartOutcome, DomainError> {
        let mut slot = self.slot.lock();
        if let Some(active) = slot.as_ref() {
            debug!(active = %active.id(), "Rejecting start, session in progress");
            return Err(DomainError::busy("Another recognition session is in progress"));
        }

        let hook = release_hook(Arc::downgrade(&self.slot), self.events.clone());
        let (session, outcome) = RecognitionSession::spawn(request, self.deps(), hook);
        debug!(session = %session.id(), mode = ?session.mode(), "Session admitted");
        *slot = Some(session);
        Ok(outcome)
    }

    async fn ensure_authorized(&self) -> Result<(), DomainError> {
        let mut status = self.engine.authorization_status();
        if status == PermissionStatus::Undetermined {
            status = self.request_permission().await;
        }
        match status {
            PermissionStatus::Granted => Ok(()),
            other => {
                warn!(status = ?other, "Speech recognition not authorized");
                Err(DomainError::permissions(other.rejection_message()))
            }
        }
    }

    fn resolve_locale(&self, locale: &str) -> String {
        if locale.is_empty() {
            self.config.read().default_locale.clone()
        } else {
            locale.to_string()
        }
    }

    fn deps(&self) -> SessionDeps {
        SessionDeps {
            engine: Arc::clone(&self.engine),
            audio_session: Arc::clone(&self.audio_session),
            audio_input: Arc::clone(&self.audio_input),
            settle_delay: self.config.read().settle_delay(),
            events: self.events.clone(),
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(session) = self.slot.lock().take() {
            debug!(session = %session.id(), "Manager dropped, tearing down session");
            session.teardown();
        }
    }
}

/// Vacates the slot if it still holds session `id`, then announces the end.
fn release_hook(
    slot: Weak<Mutex<Option<RecognitionSession>>>,
    events: broadcast::Sender<SessionEvent>,
) -> TeardownHook {
    Box::new(move |id: SessionId| {
        if let Some(slot) = slot.upgrade() {
            let mut slot = slot.lock();
            if slot.as_ref().is_some_and(|s| s.id() == id) {
                *slot = None;
            }
        }
        let _ = events.send(SessionEvent::Ended { session: id });
    })
}
