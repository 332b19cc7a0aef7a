//! Session-scoped file naming.
//!
//! A capture session is identified by its start timestamp. The recording,
//! transcript and memo written for that session all derive their file names
//! from the same identifier so the artifacts can be matched up later.
//! Two sessions started within the same second are not disambiguated.

use chrono::{DateTime, Local};

/// Identifier for one capture session, formatted `yymmdd-HHMMSS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session identifier from the current local time.
    pub fn now() -> Self {
        Self::from_timestamp(Local::now())
    }

    /// Create a session identifier from an explicit timestamp.
    pub fn from_timestamp(at: DateTime<Local>) -> Self {
        Self(at.format("%y%m%d-%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kinds of artifact a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Recording,
    Transcript,
    Memo,
}

impl ArtifactKind {
    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Recording => "recording",
            ArtifactKind::Transcript => "transcript",
            ArtifactKind::Memo => "memo",
        }
    }

    /// The extension implied by the kind. Recordings use the compressed
    /// extension; the encoder swaps it for `.wav` when it falls back.
    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Recording => "mp3",
            ArtifactKind::Transcript => "txt",
            ArtifactKind::Memo => "md",
        }
    }
}

/// Derive the file name for an artifact of the given kind.
pub fn derive_name(id: &SessionId, kind: ArtifactKind) -> String {
    format!("{}-{}.{}", id.as_str(), kind.suffix(), kind.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_id() -> SessionId {
        SessionId::from_timestamp(Local.with_ymd_and_hms(2025, 3, 9, 14, 30, 5).unwrap())
    }

    #[test]
    fn id_format_is_compact_timestamp() {
        assert_eq!(fixed_id().as_str(), "250309-143005");
    }

    #[test]
    fn names_share_the_session_id() {
        let id = fixed_id();
        assert_eq!(
            derive_name(&id, ArtifactKind::Recording),
            "250309-143005-recording.mp3"
        );
        assert_eq!(
            derive_name(&id, ArtifactKind::Transcript),
            "250309-143005-transcript.txt"
        );
        assert_eq!(derive_name(&id, ArtifactKind::Memo), "250309-143005-memo.md");
    }

    #[test]
    fn derivation_is_deterministic() {
        let id = fixed_id();
        assert_eq!(
            derive_name(&id, ArtifactKind::Memo),
            derive_name(&id, ArtifactKind::Memo)
        );
    }
}
