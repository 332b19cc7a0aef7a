//! MP3 encoding via the embedded LAME library.

use anyhow::{Context, Result};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};

use super::AudioEncoder;

/// MP3 encoder fixed at 128 kbps, quality tier "good", mono input.
pub struct LameEncoder;

impl LameEncoder {
    pub fn new() -> Self {
        Self
    }

    fn build(&self, sample_rate: u32) -> Result<mp3lame_encoder::Encoder> {
        let mut builder = Builder::new().context("failed to create LAME builder")?;

        builder
            .set_num_channels(1)
            .map_err(|e| anyhow::anyhow!("failed to set channels: {e:?}"))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| anyhow::anyhow!("failed to set sample rate: {e:?}"))?;
        builder
            .set_brate(Bitrate::Kbps128)
            .map_err(|e| anyhow::anyhow!("failed to set bitrate: {e:?}"))?;
        builder
            .set_quality(Quality::Good)
            .map_err(|e| anyhow::anyhow!("failed to set quality: {e:?}"))?;

        builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to initialize LAME encoder: {e:?}"))
    }
}

impl Default for LameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for LameEncoder {
    fn encode_samples(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
        let mut encoder = self.build(sample_rate)?;

        let mut mp3_data = Vec::new();
        mp3_data.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));

        let encoded_size = encoder
            .encode(MonoPcm(samples), mp3_data.spare_capacity_mut())
            .map_err(|e| anyhow::anyhow!("failed to encode MP3: {e:?}"))?;
        // SAFETY: encode() guarantees exactly `encoded_size` bytes of the
        // spare capacity are initialized on success.
        unsafe {
            mp3_data.set_len(encoded_size);
        }

        let flush_size = encoder
            .flush::<FlushNoGap>(mp3_data.spare_capacity_mut())
            .map_err(|e| anyhow::anyhow!("failed to flush MP3 encoder: {e:?}"))?;
        // SAFETY: flush() guarantees `flush_size` additional initialized bytes.
        unsafe {
            mp3_data.set_len(mp3_data.len() + flush_size);
        }

        Ok(mp3_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_one_second_of_silence() {
        let samples = vec![0i16; 22_050];
        let mp3 = LameEncoder::new().encode_samples(&samples, 22_050).unwrap();
        assert!(!mp3.is_empty());
    }
}
