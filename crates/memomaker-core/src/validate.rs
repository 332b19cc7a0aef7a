//! Input validation for audio files and free-text prompts.
//!
//! Validators are deliberately re-run immediately before use rather than
//! cached: a selected file may have been moved or truncated and prompt text
//! may have been edited since it was first checked.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Minimum accepted audio file size (1 KiB)
pub const MIN_FILE_SIZE: u64 = 1024;

/// Maximum accepted audio file size (100 MiB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Minimum prompt length after trimming
pub const MIN_PROMPT_LEN: usize = 10;

/// Maximum raw prompt length
pub const MAX_PROMPT_LEN: usize = 5000;

/// Audio formats the remote service accepts
pub const VALID_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac", "aac"];

const VALID_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/mp4",
    "audio/x-m4a",
    "audio/ogg",
    "audio/flac",
    "audio/aac",
];

/// Validation failures for audio files and prompt text.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported audio format '{0}' (supported: mp3, wav, m4a, ogg, flac, aac)")]
    UnsupportedFormat(String),

    #[error("file too small ({0} bytes, minimum {MIN_FILE_SIZE})")]
    TooSmall(u64),

    #[error("file too large ({0} bytes, maximum {MAX_FILE_SIZE})")]
    TooLarge(u64),

    #[error("file appears corrupted or unreadable: {0}")]
    UnreadableContent(String),

    #[error("invalid MIME type: {0}")]
    InvalidMimeType(String),

    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("prompt too short ({0} characters, minimum {MIN_PROMPT_LEN})")]
    PromptTooShort(usize),

    #[error("prompt too long ({0} characters, maximum {MAX_PROMPT_LEN})")]
    PromptTooLong(usize),
}

/// Validate an audio file's existence, extension, size and readability.
///
/// The MIME check is best-effort: a type we cannot guess from the extension
/// is not an error, only a guess that contradicts the allowed set is.
/// Returns a descriptive pass message on success. No side effects.
pub fn validate_audio(path: &Path) -> Result<String, ValidationError> {
    if !path.exists() {
        return Err(ValidationError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !VALID_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedFormat(extension));
    }

    let size = std::fs::metadata(path)
        .map_err(|e| ValidationError::UnreadableContent(e.to_string()))?
        .len();
    check_size(size)?;

    if let Some(mime) = mime_for_extension(&extension)
        && !VALID_MIME_TYPES.contains(&mime)
    {
        return Err(ValidationError::InvalidMimeType(mime.to_string()));
    }

    check_readable(path)?;

    Ok(format!("file validation passed ({size} bytes)"))
}

/// Validate free-text prompt input. Pure function.
pub fn validate_prompt(text: &str) -> Result<&'static str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    if trimmed.len() < MIN_PROMPT_LEN {
        return Err(ValidationError::PromptTooShort(trimmed.len()));
    }
    if text.len() > MAX_PROMPT_LEN {
        return Err(ValidationError::PromptTooLong(text.len()));
    }
    Ok("prompt validation passed")
}

/// Guess a MIME type from a lowercase file extension.
pub(crate) fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "aac" => Some("audio/aac"),
        _ => None,
    }
}

fn check_size(size: u64) -> Result<(), ValidationError> {
    if size < MIN_FILE_SIZE {
        return Err(ValidationError::TooSmall(size));
    }
    if size > MAX_FILE_SIZE {
        return Err(ValidationError::TooLarge(size));
    }
    Ok(())
}

/// Read the first 1 KiB to catch files that exist but cannot be opened.
fn check_readable(path: &Path) -> Result<(), ValidationError> {
    use std::io::Read;

    let mut header = [0u8; 1024];
    std::fs::File::open(path)
        .and_then(|mut f| f.read(&mut header))
        .map_err(|e| ValidationError::UnreadableContent(e.to_string()))?;
    Ok(())
}
