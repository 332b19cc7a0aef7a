//! Processor configuration.
//!
//! Everything the orchestrator and recorder need at construction time is
//! carried here explicitly; credential resolution and prompt-file discovery
//! happen in the caller (CLI/settings layer) before this struct is built.

use std::path::PathBuf;

use crate::prompts::PromptPair;
use crate::provider::DEFAULT_MODEL;

/// Configuration for one processor instance.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// API key for the generation service
    pub api_key: String,
    /// Generation model name
    pub model: String,
    /// Directory receiving recordings, transcripts and memos
    pub output_dir: PathBuf,
    /// Default transcript prompt, used when a request's prompt is blank
    pub transcript_prompt: String,
    /// Default memo prompt, used when a request's prompt is blank
    pub memo_prompt: String,
}

impl ProcessorConfig {
    pub fn new(api_key: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let prompts = PromptPair::defaults();
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            output_dir: output_dir.into(),
            transcript_prompt: prompts.transcript,
            memo_prompt: prompts.memo,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_prompts(mut self, prompts: PromptPair) -> Self {
        self.transcript_prompt = prompts.transcript;
        self.memo_prompt = prompts.memo;
        self
    }
}
