//! In-memory stand-ins for the ports, shared by the unit tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::app::SessionDeps;
use crate::domain::{
    AudioBuffer, AudioCategory, AudioPort, AudioRoute, CategoryOptions, DomainError,
    PermissionStatus, RecognitionOptions, SpeechCallbacks, SpeechErrorCode,
    TranscriptionCallbacks,
};
use crate::ports::{
    AudioInput, AudioSessionPort, AudioSink, EventSink, RecognitionTask, SpeechEngine,
};

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ==================== Audio session ====================

pub struct FakeAudioSession {
    category: Mutex<AudioCategory>,
    last_options: Mutex<Option<CategoryOptions>>,
    route: Mutex<AudioRoute>,
    active: AtomicBool,
    fail_acquire: AtomicBool,
    fail_restore: AtomicBool,
    set_category_calls: AtomicUsize,
}

impl FakeAudioSession {
    pub fn new() -> Self {
        Self::with_category(AudioCategory::SoloAmbient)
    }

    pub fn with_category(category: AudioCategory) -> Self {
        Self {
            category: Mutex::new(category),
            last_options: Mutex::new(None),
            route: Mutex::new(AudioRoute {
                outputs: vec![AudioPort::BuiltInSpeaker],
                available_inputs: vec![AudioPort::BuiltInMic],
            }),
            active: AtomicBool::new(false),
            fail_acquire: AtomicBool::new(false),
            fail_restore: AtomicBool::new(false),
            set_category_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_route(&self, route: AudioRoute) {
        *self.route.lock() = route;
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    pub fn fail_restore(&self, fail: bool) {
        self.fail_restore.store(fail, Ordering::SeqCst);
    }

    pub fn set_category_calls(&self) -> usize {
        self.set_category_calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<CategoryOptions> {
        *self.last_options.lock()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl AudioSessionPort for FakeAudioSession {
    fn category(&self) -> AudioCategory {
        *self.category.lock()
    }

    fn set_category(
        &self,
        category: AudioCategory,
        options: CategoryOptions,
    ) -> Result<(), DomainError> {
        self.set_category_calls.fetch_add(1, Ordering::SeqCst);
        let failing = if category == AudioCategory::PlayAndRecord {
            self.fail_acquire.load(Ordering::SeqCst)
        } else {
            self.fail_restore.load(Ordering::SeqCst)
        };
        if failing {
            return Err(DomainError::AudioDevice {
                message: "category rejected".to_string(),
            });
        }
        *self.category.lock() = category;
        *self.last_options.lock() = Some(options);
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<(), DomainError> {
        self.active.store(active, Ordering::SeqCst);
        Ok(())
    }

    fn current_route(&self) -> AudioRoute {
        self.route.lock().clone()
    }
}

// ==================== Audio input ====================

#[derive(Default)]
pub struct FakeAudioInput {
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    sink: Mutex<Option<AudioSink>>,
}

impl FakeAudioInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Deliver a captured block, as the capture thread would.
    pub fn push(&self, buffer: AudioBuffer) -> bool {
        match self.sink.lock().as_mut() {
            Some(sink) => sink.push(buffer),
            None => false,
        }
    }

    pub fn fault(&self, message: &str) -> bool {
        match self.sink.lock().as_ref() {
            Some(sink) => sink.fail(message),
            None => false,
        }
    }
}

#[async_trait]
impl AudioInput for FakeAudioInput {
    async fn start(&self, sink: AudioSink) -> Result<(), DomainError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(DomainError::AudioDevice {
                message: "No default input device available".to_string(),
            });
        }
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.sink.lock().take();
    }
}

// ==================== Speech engine ====================

#[derive(Default)]
pub struct FakeTaskState {
    pub appended: AtomicUsize,
    pub finished: AtomicUsize,
    pub cancelled: AtomicUsize,
}

struct FakeTask {
    state: Arc<FakeTaskState>,
}

impl RecognitionTask for FakeTask {
    fn append(&mut self, _buffer: &AudioBuffer) {
        self.state.appended.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&mut self) {
        self.state.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel(&mut self) {
        self.state.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeEngine {
    status: Mutex<PermissionStatus>,
    prompt_result: Mutex<PermissionStatus>,
    available: AtomicBool,
    file_support: AtomicBool,
    open_error: Mutex<Option<DomainError>>,
    error_while_opening: Mutex<Option<(SpeechErrorCode, String)>>,
    live_opens: AtomicUsize,
    file_opens: AtomicUsize,
    last_locale: Mutex<Option<String>>,
    last_options: Mutex<Option<RecognitionOptions>>,
    sink: Mutex<Option<EventSink>>,
    pub task: Arc<FakeTaskState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(PermissionStatus::Granted),
            prompt_result: Mutex::new(PermissionStatus::Granted),
            available: AtomicBool::new(true),
            file_support: AtomicBool::new(true),
            open_error: Mutex::new(None),
            error_while_opening: Mutex::new(None),
            live_opens: AtomicUsize::new(0),
            file_opens: AtomicUsize::new(0),
            last_locale: Mutex::new(None),
            last_options: Mutex::new(None),
            sink: Mutex::new(None),
            task: Arc::new(FakeTaskState::default()),
        }
    }

    pub fn set_authorization(&self, status: PermissionStatus, prompt_result: PermissionStatus) {
        *self.status.lock() = status;
        *self.prompt_result.lock() = prompt_result;
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_file_support(&self, supported: bool) {
        self.file_support.store(supported, Ordering::SeqCst);
    }

    pub fn fail_open(&self, error: DomainError) {
        *self.open_error.lock() = Some(error);
    }

    /// Open successfully but report `code` through the sink before returning.
    pub fn error_during_open(&self, code: SpeechErrorCode, message: &str) {
        *self.error_while_opening.lock() = Some((code, message.to_string()));
    }

    pub fn live_opens(&self) -> usize {
        self.live_opens.load(Ordering::SeqCst)
    }

    pub fn file_opens(&self) -> usize {
        self.file_opens.load(Ordering::SeqCst)
    }

    pub fn last_locale(&self) -> Option<String> {
        self.last_locale.lock().clone()
    }

    pub fn last_options(&self) -> Option<RecognitionOptions> {
        self.last_options.lock().clone()
    }

    /// The sink handed to the most recently opened task.
    pub fn sink(&self) -> EventSink {
        self.sink.lock().clone().expect("no recognition task opened")
    }

    fn open(
        &self,
        locale: &str,
        options: &RecognitionOptions,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionTask>, DomainError> {
        if let Some(err) = self.open_error.lock().clone() {
            return Err(err);
        }
        *self.last_locale.lock() = Some(locale.to_string());
        *self.last_options.lock() = Some(options.clone());
        if let Some((code, message)) = self.error_while_opening.lock().clone() {
            events.error(code, message);
        }
        *self.sink.lock() = Some(events);
        Ok(Box::new(FakeTask {
            state: Arc::clone(&self.task),
        }))
    }
}

#[async_trait]
impl SpeechEngine for FakeEngine {
    async fn request_permission(&self) -> PermissionStatus {
        let result = *self.prompt_result.lock();
        *self.status.lock() = result;
        result
    }

    fn authorization_status(&self) -> PermissionStatus {
        *self.status.lock()
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn supports_file_transcription(&self) -> bool {
        self.file_support.load(Ordering::SeqCst)
    }

    fn open_live_stream(
        &self,
        locale: &str,
        options: &RecognitionOptions,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionTask>, DomainError> {
        self.live_opens.fetch_add(1, Ordering::SeqCst);
        self.open(locale, options, events)
    }

    fn open_file_transcription(
        &self,
        _path: &Path,
        locale: &str,
        options: &RecognitionOptions,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionTask>, DomainError> {
        self.file_opens.fetch_add(1, Ordering::SeqCst);
        self.open(locale, options, events)
    }
}

// ==================== Wiring ====================

pub struct Fixture {
    pub engine: Arc<FakeEngine>,
    pub audio_session: Arc<FakeAudioSession>,
    pub audio_input: Arc<FakeAudioInput>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(FakeEngine::new()),
            audio_session: Arc::new(FakeAudioSession::new()),
            audio_input: Arc::new(FakeAudioInput::new()),
        }
    }

    pub fn deps(&self, settle_delay: Duration) -> SessionDeps {
        let (events, _) = broadcast::channel(64);
        SessionDeps {
            engine: self.engine.clone(),
            audio_session: self.audio_session.clone(),
            audio_input: self.audio_input.clone(),
            settle_delay,
            events,
        }
    }
}

// ==================== Callback recording ====================

/// Records every callback invocation as a short string, in order.
#[derive(Clone, Default)]
pub struct CallbackLog(Arc<Mutex<Vec<String>>>);

impl CallbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries other than volume updates.
    pub fn events(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| !e.starts_with("volume"))
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn speech_callbacks(&self) -> SpeechCallbacks {
        let (start, result, partial, error, end, volume) = (
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        );
        SpeechCallbacks::new()
            .on_start(move || start.push("start".to_string()))
            .on_result(move |v| result.push(format!("result:{}", v.join("|"))))
            .on_partial_result(move |v| partial.push(format!("partial:{}", v.join("|"))))
            .on_error(move |e| error.push(format!("error:{}", e.code)))
            .on_end(move || end.push("end".to_string()))
            .on_volume_changed(move |level| volume.push(format!("volume:{level:.3}")))
    }

    pub fn transcription_callbacks(&self) -> TranscriptionCallbacks {
        let (start, result, error, end) = (self.clone(), self.clone(), self.clone(), self.clone());
        TranscriptionCallbacks::new()
            .on_start(move || start.push("start".to_string()))
            .on_result(move |segments, text, is_final| {
                result.push(format!("result:{text}:{}:{is_final}", segments.len()))
            })
            .on_error(move |e| error.push(format!("error:{}", e.code)))
            .on_end(move || end.push("end".to_string()))
    }
}
