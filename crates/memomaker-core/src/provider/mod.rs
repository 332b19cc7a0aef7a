//! Remote generation backend seam.
//!
//! The pipeline depends on exactly two remote capabilities: uploading raw
//! bytes for an opaque handle, and generating text from a list of parts.
//! Everything Gemini-specific lives behind this trait in `gemini.rs`.

mod gemini;

use anyhow::Result;

pub use gemini::{DEFAULT_MODEL, GeminiBackend};

/// Opaque handle to a previously uploaded file.
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

/// One element of a generation request.
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
    File(FileHandle),
}

/// Token accounting returned by the service, when available.
#[derive(Debug, Clone, Default)]
pub struct UsageMetadata {
    pub prompt_tokens: Option<u64>,
    pub response_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// Result of one generation call.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub usage: Option<UsageMetadata>,
}

/// A remote transcription/summarization service.
pub trait GenerationBackend: Send + Sync {
    /// Upload raw bytes out-of-band and return a handle to reference later.
    fn upload_bytes(&self, data: &[u8], mime_type: &str, display_name: &str)
    -> Result<FileHandle>;

    /// Generate text from an ordered list of parts.
    fn generate(&self, parts: &[Part]) -> Result<GenerationResult>;
}
