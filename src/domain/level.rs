use super::transcription::AudioBuffer;

/// Floor of the decibel scale; silence maps here.
pub const MIN_DECIBELS: f32 = -80.0;

/// Weight of the newest block in the exponential smoothing.
pub const LEVEL_LOWPASS_FACTOR: f32 = 0.5;

/// Upper bound of the caller-facing volume scale.
pub const MAX_VOLUME: f64 = 10.0;

/// Converts PCM blocks into a smoothed volume on a 0–10 scale.
///
/// Two logical channels are tracked; mono input mirrors channel 0 into
/// channel 1. The reported volume is derived from channel 1.
#[derive(Debug, Clone, Default)]
pub struct LevelMeter {
    smoothed: [f32; 2],
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one block and return the volume in `[0, 10]`.
    ///
    /// `frame_count` is clamped to the length of each slice.
    pub fn process(&mut self, channel0: &[f32], channel1: Option<&[f32]>, frame_count: usize) -> f64 {
        let peak0 = peak_magnitude(channel0, frame_count);
        self.smoothed[0] = smooth(self.smoothed[0], to_decibels(peak0));

        let silent = match channel1 {
            Some(samples) => {
                let peak1 = peak_magnitude(samples, frame_count);
                self.smoothed[1] = smooth(self.smoothed[1], to_decibels(peak1));
                peak0 == 0.0 && peak1 == 0.0
            }
            None => {
                self.smoothed[1] = self.smoothed[0];
                peak0 == 0.0
            }
        };

        // Digital silence reads as zero while the smoothing still decays.
        if silent {
            return 0.0;
        }
        normalized_power(self.smoothed[1]) * MAX_VOLUME
    }

    /// Feed an [`AudioBuffer`], using its first two channels.
    pub fn process_buffer(&mut self, buffer: &AudioBuffer) -> f64 {
        let channel0 = buffer.channel(0).unwrap_or(&[]);
        self.process(channel0, buffer.channel(1), buffer.frame_count())
    }

    /// Current smoothed decibel value per logical channel.
    pub fn smoothed_decibels(&self) -> [f32; 2] {
        self.smoothed
    }
}

fn peak_magnitude(samples: &[f32], frame_count: usize) -> f32 {
    samples
        .iter()
        .take(frame_count)
        .fold(0.0f32, |max, &s| max.max(s.abs()))
}

fn to_decibels(peak: f32) -> f32 {
    if peak == 0.0 {
        MIN_DECIBELS
    } else {
        20.0 * peak.log10()
    }
}

fn smooth(previous: f32, decibels: f32) -> f32 {
    LEVEL_LOWPASS_FACTOR * decibels + (1.0 - LEVEL_LOWPASS_FACTOR) * previous
}

/// Map a decibel value onto `[0, 1]`.
///
/// Exactly 0 dB reads as 0, the same as silence. A smoothed level sitting at
/// full scale therefore reports no volume, so volume only grows with peak
/// amplitude below full scale.
pub fn normalized_power(decibels: f32) -> f64 {
    if decibels < MIN_DECIBELS || decibels == 0.0 {
        return 0.0;
    }
    let min_amplitude = 10f64.powf(0.05 * f64::from(MIN_DECIBELS));
    let amplitude = 10f64.powf(0.05 * f64::from(decibels));
    let p = ((amplitude - min_amplitude) / (1.0 - min_amplitude)).max(0.0).sqrt();
    p.min(1.0)
}
