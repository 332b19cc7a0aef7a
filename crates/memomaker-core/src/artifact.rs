//! Audio artifact description.

use std::path::{Path, PathBuf};

use crate::audio;
use crate::validate::{ValidationError, mime_for_extension, validate_audio};

/// A validated reference to audio bytes on disk.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
    pub mime_type: String,
    /// Known for recorder-produced artifacts, unknown for selected files.
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl AudioArtifact {
    /// Build an artifact from an existing file, validating it first.
    pub fn probe(path: &Path) -> Result<Self, ValidationError> {
        validate_audio(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let size = std::fs::metadata(path)
            .map_err(|e| ValidationError::UnreadableContent(e.to_string()))?
            .len();
        let mime_type = mime_for_extension(&extension).unwrap_or("audio/mpeg").to_string();
        Ok(Self {
            path: path.to_path_buf(),
            size,
            extension,
            mime_type,
            sample_rate: None,
            channels: None,
        })
    }

    /// Build an artifact for a file the recorder just wrote, where the
    /// capture parameters are known.
    pub fn from_recording(path: &Path) -> Result<Self, ValidationError> {
        let mut artifact = Self::probe(path)?;
        artifact.sample_rate = Some(audio::SAMPLE_RATE);
        artifact.channels = Some(audio::CHANNELS);
        Ok(artifact)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string())
    }
}
