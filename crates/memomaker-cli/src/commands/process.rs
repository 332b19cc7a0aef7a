//! `memomaker process` - run the pipeline on an existing audio file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use memomaker_core::{ProcessingRequest, TransferMethod};

#[derive(Args)]
pub struct ProcessArgs {
    /// Path to the audio file to process
    pub audio: PathBuf,

    /// Transfer method: auto, inline, or upload
    #[arg(long)]
    pub method: Option<TransferMethod>,

    /// Prompt language code (selects transcription-prompt.<lang>.md)
    #[arg(long)]
    pub language: Option<String>,

    /// Override the transcript prompt
    #[arg(long)]
    pub prompt: Option<String>,

    /// Override the memo prompt
    #[arg(long)]
    pub memo_prompt: Option<String>,
}

pub fn run(args: ProcessArgs) -> Result<()> {
    let (orchestrator, settings) = super::build_orchestrator(args.language.as_deref())?;

    let mut request = ProcessingRequest::new(args.audio);
    request.method = args.method.unwrap_or(settings.method);
    request.transcript_prompt = args.prompt.unwrap_or_default();
    request.memo_prompt = args.memo_prompt.unwrap_or_default();

    let outcome = orchestrator.run_blocking(request)?;
    println!("transcript: {}", outcome.transcript_path.display());
    println!("memo: {}", outcome.memo_path.display());
    Ok(())
}
