//! Capture sources feeding the recorder's chunk loop.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, StreamConfig};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::{CHANNELS, SAMPLE_RATE};

/// Something the capture loop can pull fixed-duration sample chunks from.
pub trait CaptureSource {
    /// Record roughly `duration` worth of 16-bit mono samples.
    fn record_chunk(&mut self, duration: Duration) -> Result<Vec<i16>>;
}

/// Builds a capture source inside the capture thread.
///
/// cpal streams are not `Send`, so the stream must be constructed on the
/// thread that will poll it; only the factory crosses the thread boundary.
pub type SourceFactory = Box<dyn FnOnce() -> Result<Box<dyn CaptureSource>> + Send>;

/// Microphone-backed source using the default cpal input device.
pub struct DeviceSource {
    // Held to keep the input stream alive; samples arrive via `rx`.
    _stream: cpal::Stream,
    rx: Receiver<Vec<i16>>,
}

impl DeviceSource {
    /// Open the default input device at 22050 Hz mono.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("no default audio input device available")?;
        let config = StreamConfig {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            buffer_size: BufferSize::Default,
        };

        let (tx, rx) = crossbeam_channel::unbounded::<Vec<i16>>();
        let stream = build_stream(&device, &config, tx)?;
        stream.play().context("failed to start audio input stream")?;

        Ok(Self { _stream: stream, rx })
    }

    /// Factory suitable for [`AudioRecorder::start`](super::AudioRecorder::start).
    pub fn factory() -> SourceFactory {
        Box::new(|| {
            let source = DeviceSource::open()?;
            Ok(Box::new(source) as Box<dyn CaptureSource>)
        })
    }
}

/// Prefer a native 16-bit stream; fall back to f32 with conversion when the
/// device does not offer i16 input.
fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    tx: Sender<Vec<i16>>,
) -> Result<cpal::Stream> {
    let tx_i16 = tx.clone();
    let native = device.build_input_stream(
        config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            let _ = tx_i16.send(data.to_vec());
        },
        log_stream_error,
        None,
    );

    match native {
        Ok(stream) => Ok(stream),
        Err(err) => {
            crate::verbose!("16-bit input stream unavailable ({err}), converting from f32");
            device
                .build_input_stream(
                    config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        let _ = tx.send(converted);
                    },
                    log_stream_error,
                    None,
                )
                .context("failed to open audio input stream")
        }
    }
}

// ALSA emits these regularly on Linux; they are non-fatal for capture.
fn log_stream_error(err: cpal::StreamError) {
    crate::verbose!("audio stream error (non-fatal): {err}");
}

impl CaptureSource for DeviceSource {
    fn record_chunk(&mut self, duration: Duration) -> Result<Vec<i16>> {
        let deadline = Instant::now() + duration;
        let mut chunk = Vec::with_capacity(SAMPLE_RATE as usize);

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(samples) => chunk.extend_from_slice(&samples),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("audio input stream closed unexpectedly")
                }
            }
        }

        Ok(chunk)
    }
}
