use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::{AudioCategory, AudioPort, AudioRoute, CategoryOptions, DomainError};
use crate::ports::AudioSessionPort;

/// Process-wide audio session.
static INSTANCE: OnceCell<Arc<SharedAudioSession>> = OnceCell::new();

/// Desktop model of the shared audio session.
///
/// Desktop hosts have no system-wide category, so the category and
/// activation are tracked here for every session in the process. The route
/// is read from the cpal host's current default devices.
pub struct SharedAudioSession {
    category: RwLock<(AudioCategory, CategoryOptions)>,
    active: AtomicBool,
}

impl SharedAudioSession {
    /// The process-wide instance.
    pub fn global() -> Arc<SharedAudioSession> {
        Arc::clone(INSTANCE.get_or_init(|| Arc::new(Self::new())))
    }

    fn new() -> Self {
        Self {
            category: RwLock::new((AudioCategory::default(), CategoryOptions::default())),
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> CategoryOptions {
        self.category.read().1
    }
}

/// Classify an endpoint by the name the host reports for it.
pub fn classify_port(name: &str, is_input: bool) -> AudioPort {
    let name = name.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    if has(&["hands-free", "handsfree", "hfp", "headset"]) && has(&["bluetooth", "bt", "airpods"])
    {
        AudioPort::BluetoothHfp
    } else if has(&["bluetooth", "airpods", "a2dp"]) {
        if is_input {
            AudioPort::BluetoothHfp
        } else {
            AudioPort::BluetoothA2dp
        }
    } else if has(&["headphone", "headset", "earphone"]) {
        AudioPort::Headphones
    } else if has(&["usb"]) {
        AudioPort::Usb
    } else if has(&["microphone", "mic"]) && is_input {
        AudioPort::BuiltInMic
    } else if has(&["speaker"]) && !is_input {
        AudioPort::BuiltInSpeaker
    } else if has(&["receiver", "earpiece"]) && !is_input {
        AudioPort::BuiltInReceiver
    } else {
        AudioPort::Other
    }
}

impl AudioSessionPort for SharedAudioSession {
    fn category(&self) -> AudioCategory {
        self.category.read().0
    }

    fn set_category(
        &self,
        category: AudioCategory,
        options: CategoryOptions,
    ) -> Result<(), DomainError> {
        let previous = std::mem::replace(&mut *self.category.write(), (category, options));
        debug!(from = ?previous.0, to = ?category, options = ?options, "Audio category set");
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<(), DomainError> {
        if self.active.swap(active, Ordering::SeqCst) != active {
            info!(active = active, "Audio session activation changed");
        }
        Ok(())
    }

    fn current_route(&self) -> AudioRoute {
        let host = cpal::default_host();
        let outputs = host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .map(|n| vec![classify_port(&n, false)])
            .unwrap_or_default();
        let available_inputs = host
            .input_devices()
            .map(|devices| {
                devices
                    .filter_map(|d| d.name().ok())
                    .map(|n| classify_port(&n, true))
                    .collect()
            })
            .unwrap_or_default();

        AudioRoute {
            outputs,
            available_inputs,
        }
    }
}
