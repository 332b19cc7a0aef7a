//! Gemini generation backend.
//!
//! Talks to the Generative Language API over blocking HTTP:
//! - `POST /upload/v1beta/files` — multipart upload, returns a file handle
//! - `POST /v1beta/models/<model>:generateContent` — JSON generation call
//!
//! Authentication is the `x-goog-api-key` header. Errors from the service
//! are surfaced verbatim together with the HTTP status.

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;

use super::{FileHandle, GenerationBackend, GenerationResult, Part, UsageMetadata};

const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Request timeout; transcription of long recordings is slow
const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    name: String,
    uri: String,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<RawUsage>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

impl From<RawUsage> for UsageMetadata {
    fn from(raw: RawUsage) -> Self {
        Self {
            prompt_tokens: raw.prompt_token_count,
            response_tokens: raw.candidates_token_count,
            total_tokens: raw.total_token_count,
        }
    }
}

fn part_to_json(part: &Part) -> serde_json::Value {
    match part {
        Part::Text(text) => json!({ "text": text }),
        Part::InlineData { mime_type, data } => json!({
            "inline_data": {
                "mime_type": mime_type,
                "data": BASE64.encode(data),
            }
        }),
        Part::File(handle) => json!({
            "file_data": {
                "mime_type": handle.mime_type,
                "file_uri": handle.uri,
            }
        }),
    }
}

impl GenerationBackend for GeminiBackend {
    fn upload_bytes(
        &self,
        data: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileHandle> {
        let metadata = json!({ "file": { "display_name": display_name } });
        let form = reqwest::blocking::multipart::Form::new()
            .part(
                "metadata",
                reqwest::blocking::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::blocking::multipart::Part::bytes(data.to_vec())
                    .file_name(display_name.to_string())
                    .mime_str(mime_type)?,
            );

        let response = self
            .client
            .post(format!("{API_BASE}/upload/v1beta/files"))
            .header("x-goog-api-key", &self.api_key)
            .multipart(form)
            .send()
            .context("failed to send upload request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("upload failed ({status}): {body}");
        }

        let parsed: UploadResponse = response.json().context("failed to parse upload response")?;
        crate::verbose!("uploaded {display_name} as {}", parsed.file.name);

        Ok(FileHandle {
            name: parsed.file.name,
            uri: parsed.file.uri,
            mime_type: parsed.file.mime_type.unwrap_or_else(|| mime_type.to_string()),
        })
    }

    fn generate(&self, parts: &[Part]) -> Result<GenerationResult> {
        let body = json!({
            "contents": [{
                "parts": parts.iter().map(part_to_json).collect::<Vec<_>>(),
            }],
        });

        let response = self
            .client
            .post(format!(
                "{API_BASE}/v1beta/models/{}:generateContent",
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .context("failed to send generation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("generation failed ({status}): {body}");
        }

        let parsed: GenerateResponse =
            response.json().context("failed to parse generation response")?;

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            anyhow::bail!("model returned no text");
        }

        Ok(GenerationResult {
            text,
            usage: parsed.usage_metadata.map(UsageMetadata::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_serializes_plainly() {
        let value = part_to_json(&Part::Text("transcribe this".into()));
        assert_eq!(value, json!({ "text": "transcribe this" }));
    }

    #[test]
    fn inline_data_is_base64_encoded() {
        let value = part_to_json(&Part::InlineData {
            mime_type: "audio/mpeg".into(),
            data: vec![1, 2, 3],
        });
        assert_eq!(value["inline_data"]["mime_type"], "audio/mpeg");
        assert_eq!(value["inline_data"]["data"], BASE64.encode([1u8, 2, 3]));
    }

    #[test]
    fn file_part_references_the_handle_uri() {
        let value = part_to_json(&Part::File(FileHandle {
            name: "files/abc".into(),
            uri: "https://example.test/files/abc".into(),
            mime_type: "audio/wav".into(),
        }));
        assert_eq!(value["file_data"]["file_uri"], "https://example.test/files/abc");
    }
}
