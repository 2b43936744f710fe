use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::domain::{
    AudioBuffer, LevelMeter, SessionId, SpeechErrorCode, SpeechErrorResult, Transcript,
};

/// Event produced by a recognizer task.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The stream or task is open and accepting input.
    Ready,
    /// Intermediate transcription.
    Partial(Transcript),
    /// Terminal transcription.
    Final(Transcript),
    /// Terminal recognizer failure.
    Error(SpeechErrorResult),
}

/// Messages processed by a session task, in arrival order.
pub(crate) enum SessionMessage {
    /// Replies once the recognizer has been asked to finish.
    Finish(oneshot::Sender<()>),
    /// Replies once teardown, including the teardown hook, has completed.
    Cancel(oneshot::Sender<()>),
    Teardown,
    Engine {
        session: SessionId,
        event: EngineEvent,
    },
    Audio {
        session: SessionId,
        level: f64,
        buffer: AudioBuffer,
    },
    AudioFault {
        session: SessionId,
        message: String,
    },
}

pub(crate) type MessageSender = mpsc::UnboundedSender<SessionMessage>;

/// Handle a recognizer uses to report events to its session.
///
/// Every event is stamped with the session identity the sink was issued
/// under. Sends after the session has ended are dropped.
#[derive(Clone)]
pub struct EventSink {
    session: SessionId,
    tx: MessageSender,
}

impl EventSink {
    pub(crate) fn new(session: SessionId, tx: MessageSender) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Report an event. Returns false if the session is gone.
    pub fn send(&self, event: EngineEvent) -> bool {
        let delivered = self
            .tx
            .send(SessionMessage::Engine {
                session: self.session,
                event,
            })
            .is_ok();
        if !delivered {
            trace!(session = %self.session, "Engine event dropped, session ended");
        }
        delivered
    }

    pub fn ready(&self) -> bool {
        self.send(EngineEvent::Ready)
    }

    pub fn partial(&self, transcript: Transcript) -> bool {
        self.send(EngineEvent::Partial(transcript))
    }

    pub fn final_result(&self, transcript: Transcript) -> bool {
        self.send(EngineEvent::Final(transcript))
    }

    pub fn error(&self, code: SpeechErrorCode, message: impl Into<String>) -> bool {
        self.send(EngineEvent::Error(SpeechErrorResult::new(code, message)))
    }
}

/// Capture-side handle for delivering audio blocks to a session.
///
/// Owns the session's level meter, so volume is computed on the capture
/// thread; the block and its level are then marshalled to the session task.
#[derive(Clone)]
pub struct AudioSink {
    session: SessionId,
    meter: LevelMeter,
    tx: MessageSender,
}

impl AudioSink {
    pub(crate) fn new(session: SessionId, tx: MessageSender) -> Self {
        Self {
            session,
            meter: LevelMeter::new(),
            tx,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Meter and forward one captured block. Returns false if the session is gone.
    pub fn push(&mut self, buffer: AudioBuffer) -> bool {
        let level = self.meter.process_buffer(&buffer);
        self.tx
            .send(SessionMessage::Audio {
                session: self.session,
                level,
                buffer,
            })
            .is_ok()
    }

    /// Report a capture failure (device lost, stream error).
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(SessionMessage::AudioFault {
                session: self.session,
                message: message.into(),
            })
            .is_ok()
    }
}
