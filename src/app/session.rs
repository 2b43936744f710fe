use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::guard::AudioResourceGuard;
use crate::domain::{
    AtomicSessionPhase, DomainError, RecognitionOptions, SessionCallbacks, SessionEvent,
    SessionId, SessionMode, SessionPhase, SpeechCallbacks, SpeechErrorCode, SpeechErrorResult,
    TranscriptionCallbacks,
};
use crate::ports::sink::{MessageSender, SessionMessage};
use crate::ports::{
    AudioInput, AudioSessionPort, AudioSink, EngineEvent, EventSink, RecognitionTask,
    SpeechEngine,
};

/// Invoked once when a session finishes teardown.
pub type TeardownHook = Box<dyn FnOnce(SessionId) + Send>;

/// Resolves exactly once with the outcome of a session start.
pub type StartOutcome = oneshot::Receiver<Result<(), DomainError>>;

/// Collaborators a session needs.
#[derive(Clone)]
pub struct SessionDeps {
    pub engine: Arc<dyn SpeechEngine>,
    pub audio_session: Arc<dyn AudioSessionPort>,
    pub audio_input: Arc<dyn AudioInput>,
    /// Pause between audio session acquisition and recognizer start.
    pub settle_delay: Duration,
    pub events: broadcast::Sender<SessionEvent>,
}

/// What a session should recognize.
pub enum SessionRequest {
    Live {
        locale: String,
        options: RecognitionOptions,
        callbacks: SpeechCallbacks,
    },
    File {
        path: PathBuf,
        locale: String,
        options: RecognitionOptions,
        callbacks: TranscriptionCallbacks,
    },
}

impl SessionRequest {
    pub fn mode(&self) -> SessionMode {
        match self {
            SessionRequest::Live { .. } => SessionMode::Live,
            SessionRequest::File { .. } => SessionMode::FileTranscription,
        }
    }
}

/// Handle to one recognition attempt.
///
/// The session itself runs on a dedicated task that owns all of its state;
/// this handle only posts messages to it, so every method returns
/// immediately and may be called from any thread, any number of times.
#[derive(Clone)]
pub struct RecognitionSession {
    id: SessionId,
    mode: SessionMode,
    phase: Arc<AtomicSessionPhase>,
    tx: MessageSender,
}

impl RecognitionSession {
    /// Spawn a session task for `request` on the current Tokio runtime.
    ///
    /// `on_teardown` runs once, after resources are released and before the
    /// start outcome is settled by teardown.
    pub fn spawn(
        request: SessionRequest,
        deps: SessionDeps,
        on_teardown: TeardownHook,
    ) -> (Self, StartOutcome) {
        let id = SessionId::new();
        let mode = request.mode();
        let phase = Arc::new(AtomicSessionPhase::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (settle_tx, settle_rx) = oneshot::channel();

        let runner = SessionRunner {
            id,
            identity: Some(id),
            mode,
            phase: Arc::clone(&phase),
            latch: StartLatch(Some(settle_tx)),
            pending_failure: None,
            cancelled_by_user: false,
            torn_down: false,
            guard: AudioResourceGuard::new(Arc::clone(&deps.audio_session)),
            task: None,
            input_started: false,
            callbacks: None,
            on_teardown: Some(on_teardown),
            weak_tx: tx.downgrade(),
            rx,
            deps,
        };
        tokio::spawn(runner.run(request));

        (
            Self {
                id,
                mode,
                phase,
                tx,
            },
            settle_rx,
        )
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.load()
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == SessionPhase::Finished
    }

    /// Ask the recognizer for a final result from the input captured so far.
    /// Resolves once the request reached the recognizer; teardown follows
    /// when that result (or an error) arrives.
    pub async fn finish(&self) {
        let (done, reply) = oneshot::channel();
        self.post(SessionMessage::Finish(done));
        let _ = reply.await;
    }

    /// Abort now, discarding further output. A start still pending settles
    /// as success.
    ///
    /// Resolves after teardown has run, so the teardown hook has already
    /// released whatever the session was holding.
    pub async fn cancel(&self) {
        let (done, reply) = oneshot::channel();
        self.post(SessionMessage::Cancel(done));
        // Dropped unanswered when the session already ended.
        let _ = reply.await;
    }

    /// Release everything. Idempotent.
    pub fn teardown(&self) {
        self.post(SessionMessage::Teardown);
    }

    #[cfg(test)]
    pub(crate) fn sender(&self) -> MessageSender {
        self.tx.clone()
    }

    fn post(&self, message: SessionMessage) {
        if self.tx.send(message).is_err() {
            debug!(session = %self.id, "Session already ended");
        }
    }
}

/// One-shot settlement of the start outcome.
struct StartLatch(Option<oneshot::Sender<Result<(), DomainError>>>);

impl StartLatch {
    /// Deliver `outcome` if nothing was delivered yet. Returns whether it was.
    fn settle(&mut self, outcome: Result<(), DomainError>) -> bool {
        match self.0.take() {
            Some(tx) => {
                // The caller may have stopped waiting.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    fn is_settled(&self) -> bool {
        self.0.is_none()
    }
}

/// State owned by the session task.
struct SessionRunner {
    id: SessionId,
    /// Cleared at teardown; messages stamped with anything else are stale.
    identity: Option<SessionId>,
    mode: SessionMode,
    phase: Arc<AtomicSessionPhase>,
    latch: StartLatch,
    pending_failure: Option<DomainError>,
    cancelled_by_user: bool,
    torn_down: bool,
    guard: AudioResourceGuard,
    task: Option<Box<dyn RecognitionTask>>,
    input_started: bool,
    callbacks: Option<SessionCallbacks>,
    on_teardown: Option<TeardownHook>,
    /// Weak so that dropping every handle ends the session.
    weak_tx: mpsc::WeakUnboundedSender<SessionMessage>,
    rx: mpsc::UnboundedReceiver<SessionMessage>,
    deps: SessionDeps,
}

impl SessionRunner {
    async fn run(mut self, request: SessionRequest) {
        debug!(session = %self.id, mode = ?self.mode, "Session task started");

        self.begin(request).await;

        while !self.torn_down {
            match self.rx.recv().await {
                Some(message) => self.handle(message).await,
                None => {
                    debug!(session = %self.id, "All session handles dropped");
                    self.teardown().await;
                }
            }
        }

        debug!(session = %self.id, "Session task finished");
    }

    async fn begin(&mut self, request: SessionRequest) {
        self.set_phase(SessionPhase::Starting);

        match request {
            SessionRequest::Live {
                locale,
                options,
                callbacks,
            } => {
                self.callbacks = Some(SessionCallbacks::Live(callbacks));
                self.start_live(&locale, &options).await;
            }
            SessionRequest::File {
                path,
                locale,
                options,
                callbacks,
            } => {
                self.callbacks = Some(SessionCallbacks::File(callbacks));
                self.start_file(&path, &locale, &options).await;
            }
        }
    }

    async fn start_live(&mut self, locale: &str, options: &RecognitionOptions) {
        if !self.guard.acquire() {
            self.fail_start(DomainError::audio("Audio session configuration failed"), true)
                .await;
            return;
        }

        if !self.settle().await {
            return;
        }

        let Some(events) = self.event_sink() else {
            self.teardown().await;
            return;
        };
        match self.deps.engine.open_live_stream(locale, options, events) {
            Ok(task) => self.task = Some(task),
            Err(e) => {
                self.fail_start(e, true).await;
                return;
            }
        }
        if !self.drain_pending().await {
            return;
        }

        let Some(sink) = self.audio_sink() else {
            self.teardown().await;
            return;
        };
        self.input_started = true;
        if let Err(e) = self.deps.audio_input.start(sink).await {
            let message = SpeechErrorResult::from(&e).message;
            self.fail_start(DomainError::audio(message), true).await;
            return;
        }

        if self.drain_pending().await {
            self.mark_ready();
        }
    }

    async fn start_file(&mut self, path: &Path, locale: &str, options: &RecognitionOptions) {
        if !self.deps.engine.supports_file_transcription() {
            self.fail_start(
                DomainError::unsupported("File transcription is not supported on this platform"),
                false,
            )
            .await;
            return;
        }

        let Some(events) = self.event_sink() else {
            self.teardown().await;
            return;
        };
        match self
            .deps
            .engine
            .open_file_transcription(path, locale, options, events)
        {
            Ok(task) => self.task = Some(task),
            Err(e) => {
                self.fail_start(e, true).await;
                return;
            }
        }

        info!(session = %self.id, path = ?path, "File transcription task created");
        if self.drain_pending().await {
            self.mark_ready();
        }
    }

    /// Handle whatever the engine or input queued while starting, so an
    /// error they reported fails the start. Returns false if the session
    /// was torn down.
    async fn drain_pending(&mut self) -> bool {
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message).await;
            if self.torn_down {
                debug!(session = %self.id, "Start abandoned by a queued message");
                return false;
            }
        }
        !self.torn_down
    }

    /// Wait out the settling delay while still serving messages, so a cancel
    /// can abandon the start. Returns false if the session was torn down.
    async fn settle(&mut self) -> bool {
        let delay = tokio::time::sleep(self.deps.settle_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return !self.torn_down,
                message = self.rx.recv() => {
                    match message {
                        Some(message) => self.handle(message).await,
                        None => self.teardown().await,
                    }
                    if self.torn_down {
                        debug!(session = %self.id, "Start abandoned during settling delay");
                        return false;
                    }
                }
            }
        }
    }

    async fn handle(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Finish(done) => {
                self.finish();
                let _ = done.send(());
            }
            SessionMessage::Cancel(done) => {
                if !self.torn_down {
                    self.cancelled_by_user = true;
                    info!(session = %self.id, "Session cancelled by user");
                    self.teardown().await;
                }
                let _ = done.send(());
            }
            SessionMessage::Teardown => self.teardown().await,
            SessionMessage::Engine { session, event } => {
                if !self.is_current(session) {
                    debug!(session = %self.id, stale = %session, "Dropping stale engine event");
                    return;
                }
                self.handle_engine_event(event).await;
            }
            SessionMessage::Audio {
                session,
                level,
                buffer,
            } => {
                if !self.is_current(session) || !self.phase.load().accepts_results() {
                    return;
                }
                if let Some(callbacks) = &self.callbacks {
                    callbacks.volume(level);
                }
                if let Some(task) = self.task.as_mut() {
                    task.append(&buffer);
                }
            }
            SessionMessage::AudioFault { session, message } => {
                if !self.is_current(session) {
                    return;
                }
                warn!(session = %self.id, error = %message, "Audio capture failed");
                self.report_error(&SpeechErrorResult::new(SpeechErrorCode::Audio, message));
                self.teardown().await;
            }
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => {
                debug!(session = %self.id, phase = ?self.phase.load(), "Recognizer ready");
            }
            EngineEvent::Partial(transcript) => {
                if !self.phase.load().accepts_results() {
                    return;
                }
                if let Some(callbacks) = &self.callbacks {
                    callbacks.partial(&transcript);
                }
            }
            EngineEvent::Final(transcript) => {
                debug!(session = %self.id, alternatives = transcript.alternatives.len(), "Final result");
                if let Some(callbacks) = &self.callbacks {
                    callbacks.final_result(&transcript);
                    callbacks.end();
                }
                self.teardown().await;
            }
            EngineEvent::Error(error) => {
                warn!(session = %self.id, code = %error.code, message = %error.message, "Recognizer error");
                if self.phase.load() == SessionPhase::Starting {
                    self.pending_failure =
                        Some(DomainError::speech(error.code, error.message.clone()));
                }
                self.report_error(&error);
                self.teardown().await;
            }
        }
    }

    fn finish(&mut self) {
        match self.task.as_mut() {
            Some(task) => {
                info!(session = %self.id, "Finishing recognition");
                task.finish();
            }
            None => debug!(session = %self.id, "Finish before recognizer started, ignoring"),
        }
    }

    fn mark_ready(&mut self) {
        if self.torn_down || self.phase.load() != SessionPhase::Starting {
            return;
        }
        self.set_phase(SessionPhase::Active);
        if let Some(callbacks) = &self.callbacks {
            callbacks.start();
        }
        if self.latch.settle(Ok(())) {
            info!(session = %self.id, mode = ?self.mode, "Session ready");
        }
    }

    async fn fail_start(&mut self, error: DomainError, notify: bool) {
        warn!(session = %self.id, error = %error, "Session failed to start");
        if notify {
            self.report_error(&SpeechErrorResult::from(&error));
        }
        self.pending_failure = Some(error);
        self.teardown().await;
    }

    fn report_error(&self, error: &SpeechErrorResult) {
        if let Some(callbacks) = &self.callbacks {
            callbacks.error(error);
        }
    }

    /// Release every resource exactly once, then settle the start if it is
    /// still pending.
    async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.set_phase(SessionPhase::TearingDown);

        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        if self.input_started {
            self.input_started = false;
            self.deps.audio_input.stop().await;
        }
        self.guard.restore();

        self.identity = None;
        self.callbacks = None;
        if let Some(hook) = self.on_teardown.take() {
            hook(self.id);
        }

        if !self.latch.is_settled() {
            let outcome = if self.cancelled_by_user {
                Ok(())
            } else {
                Err(self.pending_failure.take().unwrap_or_else(|| {
                    DomainError::recognition_fail("Cancelled or torn down before ready")
                }))
            };
            self.latch.settle(outcome);
        }

        self.set_phase(SessionPhase::Finished);
        info!(
            session = %self.id,
            cancelled_by_user = self.cancelled_by_user,
            "Session torn down"
        );
    }

    fn is_current(&self, session: SessionId) -> bool {
        self.identity == Some(session)
    }

    fn event_sink(&self) -> Option<EventSink> {
        self.weak_tx
            .upgrade()
            .map(|tx| EventSink::new(self.id, tx))
    }

    fn audio_sink(&self) -> Option<AudioSink> {
        self.weak_tx
            .upgrade()
            .map(|tx| AudioSink::new(self.id, tx))
    }

    fn set_phase(&self, to: SessionPhase) {
        let from = self.phase.swap(to);
        if from != to {
            debug!(session = %self.id, from = ?from, to = ?to, "Session phase changed");
            let _ = self.deps.events.send(SessionEvent::PhaseChanged {
                session: self.id,
                mode: self.mode,
                from,
                to,
            });
        }
    }
}
