pub mod artifact;
pub mod audio;
pub mod config;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod settings;
pub mod transfer;
pub mod validate;
pub mod verbose;

pub use artifact::AudioArtifact;
pub use audio::{AudioRecorder, CaptureSource, EncodeOutcome, RecorderState};
pub use config::ProcessorConfig;
pub use pipeline::{
    Orchestrator, PipelineError, PipelineOutcome, ProcessingRequest, RunState,
};
pub use prompts::{
    DEFAULT_MEMO_PROMPT, DEFAULT_TRANSCRIPT_PROMPT, PromptLibrary, PromptPair,
};
pub use provider::{
    FileHandle, GeminiBackend, GenerationBackend, GenerationResult, Part, UsageMetadata,
};
pub use session::{ArtifactKind, SessionId};
pub use settings::Settings;
pub use transfer::{INLINE_THRESHOLD, ResolvedTransfer, TransferMethod, select_method};
pub use validate::{ValidationError, validate_audio, validate_prompt};
pub use verbose::set_verbose;
