use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique token minted for every session start.
///
/// Every asynchronous message bound for a session carries the id it was
/// issued under; the session drops anything that does not match its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a session recognizes speech from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Microphone input, unbounded.
    Live,
    /// A pre-recorded audio file.
    FileTranscription,
}

/// Recognition session state machine.
///
/// State transitions:
/// - Idle -> Starting (spawn)
/// - Starting -> Active (recognizer ready, start settles with success)
/// - Starting -> TearingDown (start failure, cancel, or supersession)
/// - Active -> TearingDown (final result, recognizer error, cancel)
/// - TearingDown -> Finished
///
/// A session never leaves Finished; the manager discards it and a new
/// session is created for the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionPhase {
    Idle = 0,
    Starting = 1,
    Active = 2,
    TearingDown = 3,
    Finished = 4,
}

impl SessionPhase {
    /// Whether recognizer output may still reach the caller.
    #[must_use]
    pub fn accepts_results(&self) -> bool {
        matches!(self, SessionPhase::Active)
    }
}

impl From<u8> for SessionPhase {
    fn from(value: u8) -> Self {
        match value {
            0 => SessionPhase::Idle,
            1 => SessionPhase::Starting,
            2 => SessionPhase::Active,
            3 => SessionPhase::TearingDown,
            _ => SessionPhase::Finished,
        }
    }
}

impl From<SessionPhase> for u8 {
    fn from(phase: SessionPhase) -> Self {
        phase as u8
    }
}

/// Atomic wrapper for SessionPhase for lock-free reads from outside the session task.
#[derive(Debug)]
pub struct AtomicSessionPhase(AtomicU8);

impl AtomicSessionPhase {
    pub fn new(phase: SessionPhase) -> Self {
        Self(AtomicU8::new(phase.into()))
    }

    pub fn load(&self) -> SessionPhase {
        self.0.load(Ordering::Acquire).into()
    }

    /// Store a new phase, returning the previous one.
    pub fn swap(&self, phase: SessionPhase) -> SessionPhase {
        self.0.swap(phase.into(), Ordering::AcqRel).into()
    }
}

impl Default for AtomicSessionPhase {
    fn default() -> Self {
        Self::new(SessionPhase::Idle)
    }
}

/// Events broadcast by the session manager.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// A session moved between phases.
    PhaseChanged {
        session: SessionId,
        mode: SessionMode,
        from: SessionPhase,
        to: SessionPhase,
    },
    /// A session finished teardown and left the manager slot.
    Ended { session: SessionId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_phase_accepts_results() {
        assert!(!SessionPhase::Idle.accepts_results());
        assert!(!SessionPhase::Starting.accepts_results());
        assert!(SessionPhase::Active.accepts_results());
        assert!(!SessionPhase::TearingDown.accepts_results());
        assert!(!SessionPhase::Finished.accepts_results());
    }

    #[test]
    fn test_phase_roundtrip() {
        for phase in [
            SessionPhase::Idle,
            SessionPhase::Starting,
            SessionPhase::Active,
            SessionPhase::TearingDown,
            SessionPhase::Finished,
        ] {
            let value: u8 = phase.into();
            let recovered: SessionPhase = value.into();
            assert_eq!(phase, recovered);
        }
    }

    #[test]
    fn test_atomic_session_phase() {
        let atomic = AtomicSessionPhase::default();
        assert_eq!(atomic.load(), SessionPhase::Idle);

        let previous = atomic.swap(SessionPhase::Starting);
        assert_eq!(previous, SessionPhase::Idle);
        assert_eq!(atomic.load(), SessionPhase::Starting);
    }

    #[test]
    fn test_session_event_serialization() {
        let event = SessionEvent::PhaseChanged {
            session: SessionId::new(),
            mode: SessionMode::Live,
            from: SessionPhase::Starting,
            to: SessionPhase::Active,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhaseChanged");
        assert_eq!(json["data"]["mode"], "live");
        assert_eq!(json["data"]["to"], "Active");
    }
}
