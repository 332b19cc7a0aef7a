//! Audio capture and encoding.

mod encoder;
mod recorder;
mod source;

use std::time::Duration;

pub use encoder::{AudioEncoder, EncodeOutcome, LameEncoder, encode_to_file};
pub use recorder::{AudioRecorder, RecorderState};
pub use source::{CaptureSource, DeviceSource, SourceFactory};

/// Capture sample rate in Hz
pub const SAMPLE_RATE: u32 = 22_050;

/// Capture channel count (mono)
pub const CHANNELS: u16 = 1;

/// Duration of one capture chunk
pub const CHUNK_DURATION: Duration = Duration::from_secs(1);
