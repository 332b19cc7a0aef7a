//! `memomaker record` - capture from the microphone, then process.

use anyhow::Result;
use clap::Args;
use memomaker_core::{AudioRecorder, ProcessingRequest, TransferMethod};

#[derive(Args)]
pub struct RecordArgs {
    /// Transfer method: auto, inline, or upload
    #[arg(long)]
    pub method: Option<TransferMethod>,

    /// Prompt language code (selects transcription-prompt.<lang>.md)
    #[arg(long)]
    pub language: Option<String>,

    /// Save the recording but skip transcript and memo generation
    #[arg(long)]
    pub no_process: bool,
}

pub fn run(args: RecordArgs) -> Result<()> {
    let (orchestrator, settings) = super::build_orchestrator(args.language.as_deref())?;

    let mut recorder = AudioRecorder::new(settings.resolve_output_dir());
    if !recorder.start() {
        anyhow::bail!("a recording is already in progress");
    }

    println!("recording... press Enter to stop");
    super::wait_for_enter()?;

    let Some(path) = recorder.stop() else {
        anyhow::bail!("no audio was captured");
    };
    println!("recording saved to {}", path.display());

    if args.no_process {
        return Ok(());
    }

    // Transcript and memo names are derived from the capture session, so
    // all three artifacts match up on disk.
    let mut request = ProcessingRequest::new(path);
    request.method = args.method.unwrap_or(settings.method);
    request.session = recorder.session_id().cloned();

    let outcome = orchestrator.run_blocking(request)?;
    println!("transcript: {}", outcome.transcript_path.display());
    println!("memo: {}", outcome.memo_path.display());
    Ok(())
}
