//! Prompt pair loading.
//!
//! Prompts live in a single markdown document per language: a transcript
//! section (optionally introduced by a heading) followed by a `# Memo`
//! heading introducing the memo section. The library looks for
//! `transcription-prompt.<lang>.md` first and falls back to the unsuffixed
//! `transcription-prompt.md`.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_TRANSCRIPT_PROMPT: &str = "Transcribe the audio recording verbatim. \
Preserve the original language, keep speaker changes on separate lines, \
and do not add commentary or translation.";

pub const DEFAULT_MEMO_PROMPT: &str = "Write a concise memo in markdown from the transcript \
below. Summarize the key points, decisions, and action items. \
Output only the memo body.";

const PROMPT_FILE_STEM: &str = "transcription-prompt";
const MEMO_MARKER: &str = "# Memo";

/// A transcript prompt and memo prompt that belong together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub transcript: String,
    pub memo: String,
}

impl PromptPair {
    /// Built-in prompts used when no prompt document is found.
    pub fn defaults() -> Self {
        Self {
            transcript: DEFAULT_TRANSCRIPT_PROMPT.to_string(),
            memo: DEFAULT_MEMO_PROMPT.to_string(),
        }
    }
}

/// Directory-backed source of prompt documents.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the prompt pair for a language code, or None when no document
    /// exists or the document lacks the memo marker.
    pub fn load(&self, language: &str) -> Result<Option<PromptPair>> {
        let candidates = [
            format!("{PROMPT_FILE_STEM}.{language}.md"),
            format!("{PROMPT_FILE_STEM}.md"),
        ];
        for candidate in candidates {
            let path = self.dir.join(&candidate);
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                crate::verbose!("loaded prompts from {}", path.display());
                return Ok(parse_prompt_document(&content));
            }
        }
        Ok(None)
    }
}

/// Split a prompt document at the memo marker heading.
fn parse_prompt_document(content: &str) -> Option<PromptPair> {
    let (head, tail) = content.split_once(MEMO_MARKER)?;
    let transcript = strip_leading_heading(head).trim().to_string();
    let memo = tail.trim().to_string();
    if transcript.is_empty() || memo.is_empty() {
        return None;
    }
    Some(PromptPair { transcript, memo })
}

/// Drop the first line when the section opens with a markdown heading.
fn strip_leading_heading(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with('#') {
        trimmed.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
    } else {
        trimmed
    }
}
