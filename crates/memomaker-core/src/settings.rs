//! Persisted user settings.
//!
//! Stored as JSON under the platform config directory
//! (`~/.config/memomaker/settings.json` on Linux). The API key may instead
//! come from the `GOOGLE_API_KEY` environment variable; saving keys to any
//! other store is out of scope here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::transfer::TransferMethod;

/// Environment variable consulted when no API key is saved
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Generation service API key (falls back to `GOOGLE_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Prompt language code (selects `transcription-prompt.<lang>.md`)
    #[serde(default)]
    pub language: Option<String>,

    /// Default transfer method for processing runs
    #[serde(default)]
    pub method: TransferMethod,

    /// Output directory for recordings, transcripts and memos
    /// (None = current working directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Generation model override
    #[serde(default)]
    pub model: Option<String>,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("memomaker").join("settings.json"))
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unparseable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                crate::verbose!("ignoring malformed settings file: {err}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("no config directory on this platform")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Saved key first, environment variable second.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }

    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
