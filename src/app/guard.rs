use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{AudioCategory, CategoryOptions};
use crate::ports::AudioSessionPort;

/// Exclusive hold on the shared audio session for one recognition session.
///
/// `acquire` snapshots the current category and switches to play-and-record;
/// `restore` puts the snapshot back. Both are infallible at this boundary:
/// acquire reports failure as `false`, restore swallows device errors.
pub struct AudioResourceGuard {
    port: Arc<dyn AudioSessionPort>,
    prior: Option<AudioCategory>,
    acquired: bool,
}

impl AudioResourceGuard {
    pub fn new(port: Arc<dyn AudioSessionPort>) -> Self {
        Self {
            port,
            prior: None,
            acquired: false,
        }
    }

    /// Configure and activate the audio session for recognition.
    pub fn acquire(&mut self) -> bool {
        let prior = self.port.category();
        let options = self.recognition_options();

        let result = self
            .port
            .set_category(AudioCategory::PlayAndRecord, options)
            .and_then(|()| self.port.set_active(true));

        // The category may have changed even if activation failed.
        self.prior = Some(prior);
        self.acquired = true;

        match result {
            Ok(()) => {
                info!(prior = ?prior, options = ?options, "Audio session acquired");
                true
            }
            Err(e) => {
                warn!(error = %e, "Audio session configuration failed");
                false
            }
        }
    }

    /// Put back the category captured by `acquire`. No-op if never acquired.
    pub fn restore(&mut self) {
        if !self.acquired {
            return;
        }
        self.acquired = false;
        let prior = self.prior.take();

        let current = self.port.category();
        if prior == Some(current) {
            debug!(category = ?current, "Audio session category unchanged, nothing to restore");
            return;
        }

        let category = prior.unwrap_or(AudioCategory::SoloAmbient);
        let options = self.recognition_options();
        match self.port.set_category(category, options) {
            Ok(()) => info!(category = ?category, "Audio session restored"),
            Err(e) => warn!(error = %e, category = ?category, "Failed to restore audio session"),
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Whether a wired headset or Bluetooth device is on the current route.
    pub fn headset_active(&self) -> bool {
        self.port.current_route().prefers_hands_free()
    }

    fn recognition_options(&self) -> CategoryOptions {
        self.port.current_route().recognition_options()
    }
}
