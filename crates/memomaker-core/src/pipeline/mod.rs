//! Processing pipeline orchestration.
//!
//! Drives one run end to end: validate, resolve the transfer method,
//! request the transcript, persist it, request the memo, sanitize and
//! persist it, then report a timing/usage summary. At most one run may be
//! in a non-terminal state at a time; a second trigger is a logged no-op.
//!
//! Runs execute off the caller's thread when started via [`Orchestrator::process`];
//! progress and log callbacks are invoked from that worker thread and must
//! not block on user input.

mod report;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::artifact::AudioArtifact;
use crate::config::ProcessorConfig;
use crate::provider::{GenerationBackend, Part};
use crate::session::{ArtifactKind, SessionId, derive_name};
use crate::transfer::{ResolvedTransfer, TransferMethod, select_method};
use crate::validate::{ValidationError, validate_audio, validate_prompt};

use report::usage_summary;

/// States of one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Transcribing,
    Transcribed,
    Summarizing,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Idle | RunState::Done | RunState::Failed)
    }
}

/// One pipeline run request.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub audio_path: PathBuf,
    /// Transcript prompt; blank falls back to the configured default
    pub transcript_prompt: String,
    /// Memo prompt; blank falls back to the configured default
    pub memo_prompt: String,
    pub method: TransferMethod,
    /// Capture session whose naming the outputs should share, if any
    pub session: Option<SessionId>,
}

impl ProcessingRequest {
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            audio_path: audio_path.into(),
            transcript_prompt: String::new(),
            memo_prompt: String::new(),
            method: TransferMethod::Auto,
            session: None,
        }
    }
}

/// Stage-level failures, all caught at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} request failed: {message}")]
    Remote { stage: &'static str, message: String },

    #[error("failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("another processing run is already active")]
    Busy,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub transcript_path: PathBuf,
    pub memo_path: PathBuf,
    pub transfer: ResolvedTransfer,
    pub elapsed: Duration,
}

type ProgressFn = dyn Fn(f32) + Send + Sync;
type LogFn = dyn Fn(&str) + Send + Sync;

/// Drives processing runs against a generation backend.
pub struct Orchestrator {
    backend: Arc<dyn GenerationBackend>,
    config: ProcessorConfig,
    busy: Arc<AtomicBool>,
    state: Arc<Mutex<RunState>>,
    progress: Option<Arc<ProgressFn>>,
    log: Option<Arc<LogFn>>,
}

impl Clone for Orchestrator {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            busy: Arc::clone(&self.busy),
            state: Arc::clone(&self.state),
            progress: self.progress.clone(),
            log: self.log.clone(),
        }
    }
}

impl Orchestrator {
    pub fn new(config: ProcessorConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            config,
            busy: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(RunState::Idle)),
            progress: None,
            log: None,
        }
    }

    /// Register a progress callback receiving fractions in 0.1..=1.0.
    pub fn on_progress(mut self, callback: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Register an operation-log callback.
    pub fn on_log(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log = Some(Arc::new(callback));
        self
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a run on a worker thread.
    ///
    /// Returns false without side effects when a run is already active.
    pub fn process(&self, request: ProcessingRequest) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.log_line("processing already in progress, ignoring request");
            return false;
        }

        let worker = self.clone();
        std::thread::spawn(move || {
            let _ = worker.execute(request);
        });
        true
    }

    /// Run the pipeline on the calling thread.
    pub fn run_blocking(&self, request: ProcessingRequest) -> Result<PipelineOutcome, PipelineError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.log_line("processing already in progress, ignoring request");
            return Err(PipelineError::Busy);
        }
        self.execute(request)
    }

    /// Runs the staged sequence, settles the terminal state and releases the
    /// single-flight guard. The guard must already be held.
    fn execute(&self, request: ProcessingRequest) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();
        let payload_size = std::fs::metadata(&request.audio_path)
            .map(|m| m.len())
            .unwrap_or(0);

        let result = self.run_stages(&request, started);

        match &result {
            Ok(outcome) => {
                self.set_state(RunState::Done);
                self.report_progress(1.0);
                self.log_line(&usage_summary(
                    "total processing",
                    payload_size,
                    outcome.elapsed,
                    None,
                    None,
                ));
                self.log_line(&format!(
                    "processing completed in {:.2}s",
                    outcome.elapsed.as_secs_f64()
                ));
            }
            Err(err) => {
                self.set_state(RunState::Failed);
                self.log_line(&format!("error occurred: {err}"));
                self.log_line(&usage_summary(
                    "failed processing",
                    payload_size,
                    started.elapsed(),
                    None,
                    Some(&err.to_string()),
                ));
            }
        }

        self.busy.store(false, Ordering::SeqCst);
        result
    }

    fn run_stages(
        &self,
        request: &ProcessingRequest,
        started: Instant,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.set_state(RunState::Transcribing);
        self.report_progress(0.1);
        self.log_line("starting audio processing");

        // Blank prompts silently fall back to the configured defaults; this
        // substitution happens before validation so the defaults are still
        // length-checked.
        let transcript_prompt =
            prompt_or_default(&request.transcript_prompt, &self.config.transcript_prompt);
        let memo_prompt = prompt_or_default(&request.memo_prompt, &self.config.memo_prompt);

        let pass = validate_audio(&request.audio_path)?;
        self.log_line(&pass);
        validate_prompt(&transcript_prompt)?;
        validate_prompt(&memo_prompt)?;

        let artifact = AudioArtifact::probe(&request.audio_path)?;
        self.report_progress(0.2);

        let transfer = select_method(request.method, artifact.size);
        self.log_line(&format!(
            "using {} transfer ({} bytes)",
            transfer.as_str(),
            artifact.size
        ));
        self.report_progress(0.3);

        let audio_bytes = std::fs::read(&request.audio_path).map_err(|source| {
            PipelineError::Read {
                path: request.audio_path.clone(),
                source,
            }
        })?;
        self.report_progress(0.4);

        let transcript_started = Instant::now();
        let parts = match transfer {
            ResolvedTransfer::Upload => {
                self.log_line("uploading audio to the remote service");
                let handle = self
                    .backend
                    .upload_bytes(&audio_bytes, &artifact.mime_type, &artifact.file_name())
                    .map_err(|err| PipelineError::Remote {
                        stage: "upload",
                        message: format!("{err:#}"),
                    })?;
                vec![Part::Text(transcript_prompt.clone()), Part::File(handle)]
            }
            ResolvedTransfer::Inline => vec![
                Part::Text(transcript_prompt.clone()),
                Part::InlineData {
                    mime_type: artifact.mime_type.clone(),
                    data: audio_bytes,
                },
            ],
        };

        let response = self
            .backend
            .generate(&parts)
            .map_err(|err| PipelineError::Remote {
                stage: "transcript",
                message: format!("{err:#}"),
            })?;
        self.report_progress(0.6);
        let transcript = response.text;
        self.log_line("transcript generated");
        self.log_line(&usage_summary(
            "transcript generation",
            artifact.size,
            transcript_started.elapsed(),
            response.usage.as_ref(),
            None,
        ));

        let session = request.session.clone().unwrap_or_else(SessionId::now);
        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| {
            PipelineError::Persist {
                path: self.config.output_dir.clone(),
                source,
            }
        })?;

        let transcript_path = self
            .config
            .output_dir
            .join(derive_name(&session, ArtifactKind::Transcript));
        std::fs::write(&transcript_path, &transcript).map_err(|source| {
            PipelineError::Persist {
                path: transcript_path.clone(),
                source,
            }
        })?;
        self.log_line(&format!("transcript saved to {}", transcript_path.display()));
        self.set_state(RunState::Transcribed);
        self.report_progress(0.7);

        self.set_state(RunState::Summarizing);
        self.report_progress(0.8);
        let memo_started = Instant::now();
        let memo_parts = vec![
            Part::Text(memo_prompt.clone()),
            Part::Text(transcript.clone()),
        ];
        let memo_response = self
            .backend
            .generate(&memo_parts)
            .map_err(|err| PipelineError::Remote {
                stage: "memo",
                message: format!("{err:#}"),
            })?;
        self.report_progress(0.9);

        let memo = sanitize_memo(&memo_response.text);
        self.log_line(&usage_summary(
            "memo generation",
            transcript.len() as u64,
            memo_started.elapsed(),
            memo_response.usage.as_ref(),
            None,
        ));

        let memo_path = self
            .config
            .output_dir
            .join(derive_name(&session, ArtifactKind::Memo));
        std::fs::write(&memo_path, &memo).map_err(|source| PipelineError::Persist {
            path: memo_path.clone(),
            source,
        })?;
        self.log_line(&format!("memo saved to {}", memo_path.display()));

        // Best-effort: a failed open does not invalidate the run.
        if let Err(err) = open::that(&memo_path) {
            self.log_line(&format!("could not open memo file: {err}"));
        }

        Ok(PipelineOutcome {
            transcript_path,
            memo_path,
            transfer,
            elapsed: started.elapsed(),
        })
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap() = state;
    }

    fn report_progress(&self, fraction: f32) {
        if let Some(progress) = &self.progress {
            progress(fraction);
        }
    }

    fn log_line(&self, line: &str) {
        crate::verbose!("{line}");
        if let Some(log) = &self.log {
            log(line);
        }
    }
}

fn prompt_or_default(text: &str, default: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Strip the code-fence markers the model tends to wrap memo output in.
fn sanitize_memo(text: &str) -> String {
    text.replace("```markdown", "")
        .replace("```md", "")
        .replace("```html", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{FileHandle, GenerationResult, UsageMetadata};
    use chrono::TimeZone;
    use std::sync::mpsc;

    fn fixed_session() -> SessionId {
        SessionId::from_timestamp(
            chrono::Local.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        )
    }

    /// Backend whose first generate call returns the transcript and whose
    /// second returns a fenced memo. Optionally fails the transcript call.
    struct MockBackend {
        fail_transcript: bool,
        uploads: Mutex<Vec<String>>,
        generate_calls: Mutex<u32>,
    }

    impl MockBackend {
        fn new(fail_transcript: bool) -> Self {
            Self {
                fail_transcript,
                uploads: Mutex::new(Vec::new()),
                generate_calls: Mutex::new(0),
            }
        }
    }

    impl GenerationBackend for MockBackend {
        fn upload_bytes(
            &self,
            _data: &[u8],
            mime_type: &str,
            display_name: &str,
        ) -> anyhow::Result<FileHandle> {
            self.uploads.lock().unwrap().push(display_name.to_string());
            Ok(FileHandle {
                name: "files/mock".into(),
                uri: "https://example.test/files/mock".into(),
                mime_type: mime_type.to_string(),
            })
        }

        fn generate(&self, _parts: &[Part]) -> anyhow::Result<GenerationResult> {
            let mut calls = self.generate_calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                if self.fail_transcript {
                    anyhow::bail!("quota exceeded for model");
                }
                Ok(GenerationResult {
                    text: "the quick brown fox discussed quarterly results".into(),
                    usage: Some(UsageMetadata {
                        prompt_tokens: Some(120),
                        response_tokens: Some(48),
                        total_tokens: Some(168),
                    }),
                })
            } else {
                Ok(GenerationResult {
                    text: "```markdown\n# Meeting memo\n- results discussed\n```".into(),
                    usage: None,
                })
            }
        }
    }

    fn fixture(dir: &tempfile::TempDir, size: usize) -> PathBuf {
        let path = dir.path().join("input.mp3");
        std::fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    fn orchestrator_with(
        dir: &tempfile::TempDir,
        backend: Arc<dyn GenerationBackend>,
    ) -> (Orchestrator, Arc<Mutex<Vec<String>>>) {
        let config = ProcessorConfig::new("test-key", dir.path().join("out"));
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let orchestrator = Orchestrator::new(config, backend)
            .on_log(move |line| sink.lock().unwrap().push(line.to_string()));
        (orchestrator, lines)
    }

    #[test]
    fn small_file_runs_inline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let audio = fixture(&dir, 2 * 1024 * 1024);
        let backend = Arc::new(MockBackend::new(false));
        let (orchestrator, _lines) = orchestrator_with(&dir, backend.clone());

        let mut request = ProcessingRequest::new(&audio);
        request.session = Some(fixed_session());
        let outcome = orchestrator.run_blocking(request).unwrap();

        assert_eq!(outcome.transfer, ResolvedTransfer::Inline);
        assert!(backend.uploads.lock().unwrap().is_empty());
        assert_eq!(orchestrator.state(), RunState::Done);

        let transcript = std::fs::read_to_string(&outcome.transcript_path).unwrap();
        assert!(transcript.contains("quarterly results"));

        let memo = std::fs::read_to_string(&outcome.memo_path).unwrap();
        assert!(memo.contains("Meeting memo"));
        assert!(!memo.contains("```"));
    }

    #[test]
    fn upload_hint_forces_the_upload_path() {
        let dir = tempfile::tempdir().unwrap();
        let audio = fixture(&dir, 4096);
        let backend = Arc::new(MockBackend::new(false));
        let (orchestrator, _lines) = orchestrator_with(&dir, backend.clone());

        let mut request = ProcessingRequest::new(&audio);
        request.method = TransferMethod::Upload;
        let outcome = orchestrator.run_blocking(request).unwrap();

        assert_eq!(outcome.transfer, ResolvedTransfer::Upload);
        assert_eq!(backend.uploads.lock().unwrap().as_slice(), ["input.mp3"]);
    }

    #[test]
    fn transcript_failure_leaves_no_memo_behind() {
        let dir = tempfile::tempdir().unwrap();
        let audio = fixture(&dir, 4096);
        let backend = Arc::new(MockBackend::new(true));
        let (orchestrator, lines) = orchestrator_with(&dir, backend);

        let mut request = ProcessingRequest::new(&audio);
        request.session = Some(fixed_session());
        let err = orchestrator.run_blocking(request).unwrap_err();

        assert!(matches!(err, PipelineError::Remote { stage: "transcript", .. }));
        assert_eq!(orchestrator.state(), RunState::Failed);

        let memo_path = dir
            .path()
            .join("out")
            .join(derive_name(&fixed_session(), ArtifactKind::Memo));
        assert!(!memo_path.exists());

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.contains("quota exceeded for model")));
    }

    #[test]
    fn validation_failure_reports_before_any_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::new(false));
        let (orchestrator, _lines) = orchestrator_with(&dir, backend.clone());

        let request = ProcessingRequest::new(dir.path().join("missing.mp3"));
        let err = orchestrator.run_blocking(request).unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(*backend.generate_calls.lock().unwrap(), 0);
        assert!(!orchestrator.is_busy());
    }

    #[test]
    fn blank_prompts_fall_back_to_configured_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let audio = fixture(&dir, 4096);
        let backend = Arc::new(MockBackend::new(false));
        let (orchestrator, _lines) = orchestrator_with(&dir, backend);

        let mut request = ProcessingRequest::new(&audio);
        request.transcript_prompt = "   ".into();
        request.memo_prompt = String::new();
        assert!(orchestrator.run_blocking(request).is_ok());
    }

    /// Backend that parks in generate() until released, so a run can be held
    /// in a non-terminal state.
    struct BlockingBackend {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl GenerationBackend for BlockingBackend {
        fn upload_bytes(
            &self,
            _data: &[u8],
            mime_type: &str,
            _display_name: &str,
        ) -> anyhow::Result<FileHandle> {
            Ok(FileHandle {
                name: "files/blocked".into(),
                uri: "uri".into(),
                mime_type: mime_type.to_string(),
            })
        }

        fn generate(&self, _parts: &[Part]) -> anyhow::Result<GenerationResult> {
            self.release.lock().unwrap().recv().ok();
            Ok(GenerationResult {
                text: "held response".into(),
                usage: None,
            })
        }
    }

    #[test]
    fn second_run_is_rejected_while_first_is_active() {
        let dir = tempfile::tempdir().unwrap();
        let audio = fixture(&dir, 4096);
        let (tx, rx) = mpsc::channel();
        let backend = Arc::new(BlockingBackend {
            release: Mutex::new(rx),
        });
        let (orchestrator, _lines) = orchestrator_with(&dir, backend);

        assert!(orchestrator.process(ProcessingRequest::new(&audio)));

        // Wait for the worker to pass validation and enter the remote call.
        for _ in 0..200 {
            if orchestrator.is_busy() && orchestrator.state() == RunState::Transcribing {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(!orchestrator.process(ProcessingRequest::new(&audio)));
        assert!(matches!(
            orchestrator.run_blocking(ProcessingRequest::new(&audio)),
            Err(PipelineError::Busy)
        ));

        // Release transcript and memo calls, then wait for the terminal state.
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        for _ in 0..400 {
            if !orchestrator.is_busy() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(orchestrator.state(), RunState::Done);
    }

    #[test]
    fn sanitize_strips_known_fences() {
        assert_eq!(sanitize_memo("```markdown\nbody\n```"), "body");
        assert_eq!(sanitize_memo("```md\nbody\n```"), "body");
        assert_eq!(sanitize_memo("```html\n<p>body</p>\n```"), "<p>body</p>");
        assert_eq!(sanitize_memo("  plain body  "), "plain body");
    }
}
