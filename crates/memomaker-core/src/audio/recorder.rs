//! Microphone recorder with a chunked background capture loop.
//!
//! State machine: `Idle -> Recording -> Stopping -> {Saved, Failed}`, with
//! `Saved`/`Failed` accepting a new `start()` like `Idle` does.
//!
//! Concurrency contract: `start`/`stop` run on the caller's thread; the
//! capture loop runs on its own thread and shares only the chunk buffer and
//! the recording flag. `stop` joins the capture thread before touching the
//! buffer, so the encode step never races a late chunk append.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::encoder::{EncodeOutcome, LameEncoder, encode_to_file};
use super::source::{DeviceSource, SourceFactory};
use super::{CHUNK_DURATION, SAMPLE_RATE};
use crate::session::{ArtifactKind, SessionId, derive_name};

/// Recorder lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopping,
    Saved,
    Failed,
}

type CompletionCallback = Box<dyn Fn(Option<&std::path::Path>) + Send + Sync>;

struct CaptureSession {
    id: SessionId,
    chunks: Arc<Mutex<Vec<Vec<i16>>>>,
    handle: JoinHandle<()>,
}

/// Owns one capture session at a time and persists its output.
pub struct AudioRecorder {
    output_dir: PathBuf,
    recording: Arc<AtomicBool>,
    state: RecorderState,
    session: Option<CaptureSession>,
    last_session_id: Option<SessionId>,
    on_complete: Option<CompletionCallback>,
}

impl AudioRecorder {
    /// Create a recorder that writes recordings into `output_dir`.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            recording: Arc::new(AtomicBool::new(false)),
            state: RecorderState::Idle,
            session: None,
            last_session_id: None,
            on_complete: None,
        }
    }

    /// Register a callback invoked with the saved path (or None) after stop.
    pub fn on_complete(&mut self, callback: impl Fn(Option<&std::path::Path>) + Send + Sync + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Identifier of the current or most recent capture session.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.last_session_id.as_ref()
    }

    /// Start capturing from the default microphone.
    ///
    /// Returns false (and does nothing) when a capture is already running.
    pub fn start(&mut self) -> bool {
        self.start_with_source(DeviceSource::factory())
    }

    /// Start capturing from a caller-supplied source.
    pub fn start_with_source(&mut self, factory: SourceFactory) -> bool {
        if self.recording.load(Ordering::SeqCst) {
            crate::verbose!("recording already in progress, ignoring start");
            return false;
        }

        let id = SessionId::now();
        let chunks = Arc::new(Mutex::new(Vec::new()));
        self.recording.store(true, Ordering::SeqCst);
        self.state = RecorderState::Recording;
        self.last_session_id = Some(id.clone());

        let flag = Arc::clone(&self.recording);
        let buffer = Arc::clone(&chunks);
        let handle = std::thread::spawn(move || capture_loop(factory, flag, buffer));

        self.session = Some(CaptureSession { id, chunks, handle });
        crate::verbose!("capture session {} started", self.last_session_id.as_ref().unwrap());
        true
    }

    /// Stop capturing, encode the buffered audio and return the written path.
    ///
    /// Blocks until the capture thread has fully exited. Returns None when
    /// no audio was captured or the recording could not be persisted.
    pub fn stop(&mut self) -> Option<PathBuf> {
        let session = self.session.take()?;
        self.state = RecorderState::Stopping;
        self.recording.store(false, Ordering::SeqCst);

        if session.handle.join().is_err() {
            crate::verbose!("capture thread panicked");
        }

        // The capture thread is gone; the buffer is exclusively ours now.
        let chunks = std::mem::take(&mut *session.chunks.lock().unwrap());
        if chunks.is_empty() {
            crate::verbose!("no audio captured in session {}", session.id);
            self.state = RecorderState::Idle;
            self.notify(None);
            return None;
        }

        let samples: Vec<i16> = chunks.concat();
        crate::verbose!(
            "session {} captured {} chunks ({} samples)",
            session.id,
            chunks.len(),
            samples.len()
        );

        match self.persist(&session.id, &samples) {
            Ok(outcome) => {
                if let EncodeOutcome::Fallback(path) = &outcome {
                    crate::verbose!("saved uncompressed recording to {}", path.display());
                }
                self.state = RecorderState::Saved;
                let path = outcome.into_path();
                self.notify(Some(&path));
                Some(path)
            }
            Err(err) => {
                crate::verbose!("failed to persist recording: {err:#}");
                self.state = RecorderState::Failed;
                self.notify(None);
                None
            }
        }
    }

    fn persist(&self, id: &SessionId, samples: &[i16]) -> anyhow::Result<EncodeOutcome> {
        std::fs::create_dir_all(&self.output_dir)?;
        let target = self.output_dir.join(derive_name(id, ArtifactKind::Recording));
        encode_to_file(&LameEncoder::new(), samples, SAMPLE_RATE, &target)
    }

    fn notify(&self, path: Option<&std::path::Path>) {
        if let Some(callback) = &self.on_complete {
            callback(path);
        }
    }
}

/// Background loop: pull fixed-duration chunks until the flag clears.
///
/// A chunk-acquisition error is logged and treated as an implicit stop; it
/// never propagates to the caller.
fn capture_loop(factory: SourceFactory, flag: Arc<AtomicBool>, buffer: Arc<Mutex<Vec<Vec<i16>>>>) {
    let mut source = match factory() {
        Ok(source) => source,
        Err(err) => {
            crate::verbose!("failed to open capture source: {err:#}");
            flag.store(false, Ordering::SeqCst);
            return;
        }
    };

    while flag.load(Ordering::SeqCst) {
        match source.record_chunk(CHUNK_DURATION) {
            Ok(chunk) => {
                if !chunk.is_empty() {
                    buffer.lock().unwrap().push(chunk);
                }
            }
            Err(err) => {
                crate::verbose!("chunk capture failed, stopping: {err:#}");
                flag.store(false, Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CaptureSource;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Source that replays a fixed script of chunk results, then silence.
    struct ScriptedSource {
        script: VecDeque<anyhow::Result<Vec<i16>>>,
    }

    impl ScriptedSource {
        fn factory(script: Vec<anyhow::Result<Vec<i16>>>) -> SourceFactory {
            let script: VecDeque<_> = script.into();
            Box::new(move || Ok(Box::new(ScriptedSource { script }) as Box<dyn CaptureSource>))
        }
    }

    impl CaptureSource for ScriptedSource {
        fn record_chunk(&mut self, _duration: Duration) -> anyhow::Result<Vec<i16>> {
            std::thread::sleep(Duration::from_millis(5));
            self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached within timeout");
    }

    #[test]
    fn stop_without_audio_returns_none_and_idles() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = AudioRecorder::new(dir.path().to_path_buf());

        assert!(recorder.start_with_source(ScriptedSource::factory(vec![])));
        assert!(recorder.stop().is_none());
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn captured_chunks_end_up_in_a_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = AudioRecorder::new(dir.path().to_path_buf());

        let chunk = vec![512i16; SAMPLE_RATE as usize];
        let script = vec![Ok(chunk.clone()), Ok(chunk)];
        assert!(recorder.start_with_source(ScriptedSource::factory(script)));
        std::thread::sleep(Duration::from_millis(50));

        let path = recorder.stop().expect("recording should be saved");
        assert_eq!(recorder.state(), RecorderState::Saved);
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert!(path.file_name().unwrap().to_str().unwrap().contains("recording"));
    }

    #[test]
    fn second_start_is_rejected_while_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = AudioRecorder::new(dir.path().to_path_buf());

        assert!(recorder.start_with_source(ScriptedSource::factory(vec![])));
        assert!(!recorder.start_with_source(ScriptedSource::factory(vec![])));
        recorder.stop();
    }

    #[test]
    fn chunk_error_acts_as_implicit_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = AudioRecorder::new(dir.path().to_path_buf());

        let script = vec![Err(anyhow::anyhow!("device unplugged"))];
        assert!(recorder.start_with_source(ScriptedSource::factory(script)));

        wait_until(|| !recorder.is_recording());
        assert!(recorder.stop().is_none());
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn completion_callback_sees_the_saved_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = AudioRecorder::new(dir.path().to_path_buf());
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        recorder.on_complete(move |path| {
            *sink.lock().unwrap() = path.map(|p| p.to_path_buf());
        });

        let script = vec![Ok(vec![64i16; 1024])];
        assert!(recorder.start_with_source(ScriptedSource::factory(script)));
        std::thread::sleep(Duration::from_millis(30));

        let path = recorder.stop().unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some(path.as_path()));
    }
}
