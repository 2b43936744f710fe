use std::fmt;
use std::sync::Arc;

use super::error::SpeechErrorResult;
use super::transcription::{Transcript, TranscriptionSegment};

type Notify = Arc<dyn Fn() + Send + Sync>;
type TextNotify = Arc<dyn Fn(&[String]) + Send + Sync>;
type SegmentNotify = Arc<dyn Fn(&[TranscriptionSegment], &str, bool) + Send + Sync>;
type ErrorNotify = Arc<dyn Fn(&SpeechErrorResult) + Send + Sync>;
type VolumeNotify = Arc<dyn Fn(f64) + Send + Sync>;

/// Callbacks for live (microphone) recognition.
///
/// All callbacks run on the session task, in the order the recognizer
/// produced them.
#[derive(Clone, Default)]
pub struct SpeechCallbacks {
    on_start: Option<Notify>,
    on_result: Option<TextNotify>,
    on_partial_result: Option<TextNotify>,
    on_error: Option<ErrorNotify>,
    on_end: Option<Notify>,
    on_volume_changed: Option<VolumeNotify>,
}

impl SpeechCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(f));
        self
    }

    /// Final alternatives, best first.
    pub fn on_result(mut self, f: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_result = Some(Arc::new(f));
        self
    }

    pub fn on_partial_result(mut self, f: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_partial_result = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&SpeechErrorResult) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_end(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_end = Some(Arc::new(f));
        self
    }

    /// Volume on a 0–10 scale.
    pub fn on_volume_changed(mut self, f: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_volume_changed = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for SpeechCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_result", &self.on_result.is_some())
            .field("on_partial_result", &self.on_partial_result.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_volume_changed", &self.on_volume_changed.is_some())
            .finish()
    }
}

/// Callbacks for file transcription.
#[derive(Clone, Default)]
pub struct TranscriptionCallbacks {
    on_start: Option<Notify>,
    on_result: Option<SegmentNotify>,
    on_error: Option<ErrorNotify>,
    on_end: Option<Notify>,
}

impl TranscriptionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(f));
        self
    }

    /// Segments, full transcription, and whether the result is final.
    pub fn on_result(
        mut self,
        f: impl Fn(&[TranscriptionSegment], &str, bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_result = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&SpeechErrorResult) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_end(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_end = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for TranscriptionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_result", &self.on_result.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

/// Callback set owned by a session, dispatched by event kind.
#[derive(Debug, Clone)]
pub enum SessionCallbacks {
    Live(SpeechCallbacks),
    File(TranscriptionCallbacks),
}

impl SessionCallbacks {
    pub fn start(&self) {
        let cb = match self {
            SessionCallbacks::Live(c) => &c.on_start,
            SessionCallbacks::File(c) => &c.on_start,
        };
        if let Some(cb) = cb {
            cb();
        }
    }

    pub fn partial(&self, transcript: &Transcript) {
        match self {
            SessionCallbacks::Live(c) => {
                if let Some(cb) = &c.on_partial_result {
                    cb(&transcript.alternatives);
                }
            }
            SessionCallbacks::File(c) => {
                if let Some(cb) = &c.on_result {
                    cb(&transcript.segments, transcript.best(), false);
                }
            }
        }
    }

    pub fn final_result(&self, transcript: &Transcript) {
        match self {
            SessionCallbacks::Live(c) => {
                if let Some(cb) = &c.on_result {
                    cb(&transcript.alternatives);
                }
            }
            SessionCallbacks::File(c) => {
                if let Some(cb) = &c.on_result {
                    cb(&transcript.segments, transcript.best(), true);
                }
            }
        }
    }

    pub fn error(&self, error: &SpeechErrorResult) {
        let cb = match self {
            SessionCallbacks::Live(c) => &c.on_error,
            SessionCallbacks::File(c) => &c.on_error,
        };
        if let Some(cb) = cb {
            cb(error);
        }
    }

    pub fn end(&self) {
        let cb = match self {
            SessionCallbacks::Live(c) => &c.on_end,
            SessionCallbacks::File(c) => &c.on_end,
        };
        if let Some(cb) = cb {
            cb();
        }
    }

    /// Only live sessions report volume.
    pub fn volume(&self, level: f64) {
        if let SessionCallbacks::Live(c) = self {
            if let Some(cb) = &c.on_volume_changed {
                cb(level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_live_dispatch() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let callbacks = SessionCallbacks::Live(
            SpeechCallbacks::new()
                .on_partial_result(move |v| a.lock().push(format!("partial:{}", v.join("|"))))
                .on_result(move |v| b.lock().push(format!("final:{}", v.join("|"))))
                .on_volume_changed(move |level| c.lock().push(format!("volume:{level}"))),
        );

        callbacks.partial(&Transcript::from_alternatives(vec!["hel".into()]));
        callbacks.final_result(&Transcript::from_alternatives(vec!["hello".into(), "yellow".into()]));
        callbacks.volume(2.5);
        // Unset callbacks are skipped.
        callbacks.start();
        callbacks.end();

        assert_eq!(
            *log.lock(),
            vec!["partial:hel", "final:hello|yellow", "volume:2.5"]
        );
    }

    #[test]
    fn test_file_dispatch_flags_finality() {
        let log = Arc::new(Mutex::new(Vec::<(String, bool, usize)>::new()));
        let sink = Arc::clone(&log);
        let callbacks = SessionCallbacks::File(TranscriptionCallbacks::new().on_result(
            move |segments, text, is_final| sink.lock().push((text.to_string(), is_final, segments.len())),
        ));

        callbacks.partial(&Transcript::from_text("hello"));
        callbacks.final_result(&Transcript::from_text("hello there"));
        callbacks.volume(9.0);

        assert_eq!(
            *log.lock(),
            vec![
                ("hello".to_string(), false, 1),
                ("hello there".to_string(), true, 1)
            ]
        );
    }
}
