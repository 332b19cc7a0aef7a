//! Audio encoding with a compressed-first, WAV-fallback policy.

mod lame;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use lame::LameEncoder;

/// Trait for encoding raw PCM samples to a compressed format.
pub trait AudioEncoder: Send + Sync {
    /// Encode 16-bit mono PCM samples to compressed bytes.
    fn encode_samples(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<u8>>;
}

/// How a recording ended up on disk.
///
/// `Fallback` is a degraded-but-successful save: the compressed encoder was
/// unavailable or failed, so the samples went into an uncompressed WAV
/// container at the same sample rate instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOutcome {
    Compressed(PathBuf),
    Fallback(PathBuf),
}

impl EncodeOutcome {
    pub fn path(&self) -> &Path {
        match self {
            EncodeOutcome::Compressed(path) | EncodeOutcome::Fallback(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            EncodeOutcome::Compressed(path) | EncodeOutcome::Fallback(path) => path,
        }
    }
}

/// Encode samples to `target` (expected to carry the compressed extension),
/// falling back to a sibling `.wav` file when compression fails.
pub fn encode_to_file(
    encoder: &dyn AudioEncoder,
    samples: &[i16],
    sample_rate: u32,
    target: &Path,
) -> Result<EncodeOutcome> {
    match encoder.encode_samples(samples, sample_rate) {
        Ok(encoded) => {
            std::fs::write(target, &encoded)
                .with_context(|| format!("failed to write {}", target.display()))?;
            Ok(EncodeOutcome::Compressed(target.to_path_buf()))
        }
        Err(err) => {
            crate::verbose!("compressed encoding failed, writing WAV instead: {err:#}");
            let wav_path = target.with_extension("wav");
            write_wav(samples, sample_rate, &wav_path)?;
            Ok(EncodeOutcome::Fallback(wav_path))
        }
    }
}

fn write_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize().context("failed to finalize WAV file")?;
    Ok(())
}
