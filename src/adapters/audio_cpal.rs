use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig, SupportedBufferSize};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::domain::{AudioBuffer, AudioInputConfig, DomainError};
use crate::ports::{AudioInput, AudioSink};

/// Commands sent to the capture thread.
enum CaptureCommand {
    Start {
        sink: AudioSink,
        reply: oneshot::Sender<Result<(), DomainError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Device and stream helpers.
mod capture {
    use super::*;

    pub fn get_device(device_id: Option<&str>) -> Result<Device, DomainError> {
        let host = cpal::default_host();

        if let Some(id) = device_id {
            let devices = host.input_devices().map_err(|e| DomainError::AudioDevice {
                message: format!("Failed to enumerate devices: {}", e),
            })?;

            if let Some(device) = devices.into_iter().find(|d| d.name().is_ok_and(|n| n == id)) {
                return Ok(device);
            }
            warn!(device_id = %id, "Configured device not found, falling back to default");
        }

        host.default_input_device()
            .ok_or_else(|| DomainError::AudioDevice {
                message: "No default input device available".to_string(),
            })
    }

    /// Fixed block size when the device accepts it, otherwise the device default.
    pub fn buffer_size_for(supported: &SupportedBufferSize, frames: u32) -> BufferSize {
        match supported {
            SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&frames) => {
                BufferSize::Fixed(frames)
            }
            _ => BufferSize::Default,
        }
    }

    pub fn i16_to_f32(data: &[i16]) -> Vec<f32> {
        data.iter().map(|&s| s as f32 / 32768.0).collect()
    }

    pub fn build_stream(
        device: &Device,
        buffer_frames: u32,
        mut sink: AudioSink,
    ) -> Result<Stream, DomainError> {
        let supported = device
            .default_input_config()
            .map_err(|e| DomainError::AudioDevice {
                message: format!("Failed to get default config: {}", e),
            })?;
        let sample_format = supported.sample_format();
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: buffer_size_for(supported.buffer_size(), buffer_frames),
        };

        debug!(
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = ?sample_format,
            buffer_size = ?config.buffer_size,
            "Capture stream config"
        );

        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        let fault_sink = sink.clone();
        // Only the first stream error is reported.
        let faulted = Arc::new(AtomicBool::new(false));
        let on_error = move |err: cpal::StreamError| {
            error!(?err, "Audio stream error");
            if !faulted.swap(true, Ordering::SeqCst) {
                fault_sink.fail(err.to_string());
            }
        };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    sink.push(AudioBuffer::from_interleaved(data, channels, sample_rate));
                },
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples = i16_to_f32(data);
                    sink.push(AudioBuffer::from_interleaved(&samples, channels, sample_rate));
                },
                on_error,
                None,
            ),
            _ => {
                return Err(DomainError::AudioDevice {
                    message: format!("Unsupported sample format: {:?}", sample_format),
                });
            }
        }
        .map_err(|e| DomainError::AudioDevice {
            message: format!("Failed to build stream: {}", e),
        })?;

        Ok(stream)
    }
}

/// Capture thread loop. Owns the stream, which is not `Send`.
fn capture_thread_main(
    config: AudioInputConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<CaptureCommand>,
) {
    let mut stream: Option<Stream> = None;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            CaptureCommand::Start { sink, reply } => {
                if stream.take().is_some() {
                    warn!("Capture restarted while running, previous stream dropped");
                }
                let session = sink.session();
                let result = (|| -> Result<Stream, DomainError> {
                    let device = capture::get_device(config.device_id.as_deref())?;
                    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                    let new_stream = capture::build_stream(&device, config.buffer_frames, sink)?;

                    new_stream.play().map_err(|e| DomainError::AudioDevice {
                        message: format!("Failed to start stream: {}", e),
                    })?;

                    info!(device = %device_name, session = %session, "Capture started");
                    Ok(new_stream)
                })();

                let result = result.map(|s| {
                    stream = Some(s);
                });
                let _ = reply.send(result);
            }
            CaptureCommand::Stop { reply } => {
                if stream.take().is_some() {
                    info!("Capture stopped");
                }
                let _ = reply.send(());
            }
            CaptureCommand::Shutdown => break,
        }
    }
    debug!("Capture thread shutting down");
}

/// Microphone capture through cpal.
///
/// The stream lives on a dedicated `audio-capture` thread; blocks are metered
/// and forwarded to the session from the cpal data callback.
pub struct CpalAudioInput {
    config: AudioInputConfig,
    cmd_tx: mpsc::UnboundedSender<CaptureCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CpalAudioInput {
    pub fn new() -> Result<Self, DomainError> {
        Self::with_config(AudioInputConfig::default())
    }

    pub fn with_config(config: AudioInputConfig) -> Result<Self, DomainError> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let thread_config = config.clone();
        let thread_handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || capture_thread_main(thread_config, cmd_rx))
            .map_err(|e| DomainError::AudioDevice {
                message: format!("Failed to spawn audio thread: {}", e),
            })?;

        info!(
            buffer_frames = config.buffer_frames,
            device_id = ?config.device_id,
            "CpalAudioInput initialized"
        );

        Ok(Self {
            config,
            cmd_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    pub fn config(&self) -> &AudioInputConfig {
        &self.config
    }
}

impl Drop for CpalAudioInput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(CaptureCommand::Shutdown);

        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

#[async_trait]
impl AudioInput for CpalAudioInput {
    async fn start(&self, sink: AudioSink) -> Result<(), DomainError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.cmd_tx
            .send(CaptureCommand::Start {
                sink,
                reply: reply_tx,
            })
            .map_err(|_| DomainError::AudioDevice {
                message: "Audio thread not running".to_string(),
            })?;

        reply_rx.await.map_err(|_| DomainError::AudioDevice {
            message: "Audio thread did not respond".to_string(),
        })?
    }

    async fn stop(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(CaptureCommand::Stop { reply: reply_tx })
            .is_err()
        {
            return;
        }
        let _ = reply_rx.await;
    }
}
