use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Block of planar PCM audio that is securely zeroed on drop.
/// Captured audio is handed to the recognizer and never persisted.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct AudioBuffer {
    /// One sample vector per channel, each in the range [-1, 1].
    channels: Vec<Vec<f32>>,
    /// Sample rate in Hz.
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new empty mono buffer.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            channels: vec![Vec::new()],
            sample_rate,
        }
    }

    /// Create a mono buffer from samples.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Create a buffer from already deinterleaved channels.
    pub fn from_planar(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Deinterleave frames of `channel_count` samples each.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(data: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let frames = data.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in data.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self {
            channels,
            sample_rate,
        }
    }

    /// Samples of one channel, if present.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

/// Single segment of a transcription.
///
/// Timestamps and durations are best-effort: engines without per-segment
/// timing report a single synthetic segment with zero timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    pub transcription: String,
    /// Offset from the start of the audio, in seconds.
    pub timestamp: f64,
    /// Segment length, in seconds.
    pub duration: f64,
}

/// Recognizer output: ranked alternatives plus the segments of the best one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Candidate transcriptions, best first.
    pub alternatives: Vec<String>,
    /// Segments of the best alternative.
    pub segments: Vec<TranscriptionSegment>,
}

impl Transcript {
    pub fn new(alternatives: Vec<String>, segments: Vec<TranscriptionSegment>) -> Self {
        Self {
            alternatives,
            segments,
        }
    }

    /// Transcript without timing, carrying one synthetic segment.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            segments: vec![TranscriptionSegment {
                transcription: text.clone(),
                timestamp: 0.0,
                duration: 0.0,
            }],
            alternatives: vec![text],
        }
    }

    /// Transcript made of alternatives only.
    pub fn from_alternatives(alternatives: Vec<String>) -> Self {
        Self {
            alternatives,
            segments: Vec::new(),
        }
    }

    /// The best transcription, or an empty string.
    pub fn best(&self) -> &str {
        self.alternatives.first().map_or("", String::as_str)
    }
}
