//! Gemini `generateContent` backend over blocking HTTP.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::{GenerationBackend, Result};

/// Default REST endpoint for the Generative Language API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection settings for [`GeminiBackend`].
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// API key, passed explicitly by the caller.
    pub api_key: String,
    /// Model identifier, e.g. `gemini-2.0-pro-exp-02-05`.
    pub model: String,
    /// Base URL without trailing slash.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend calling Gemini through its REST API.
pub struct GeminiBackend {
    client: Client,
    settings: GeminiSettings,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    /// Build a backend from explicit settings.
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(BackendError::Auth("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        debug!(
            "Gemini backend ready: model={}, endpoint={}",
            settings.model, settings.endpoint
        );

        Ok(Self { client, settings })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.settings.timeout.as_secs())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

impl GenerationBackend for GeminiBackend {
    fn generate(&self, instruction: &str, temperature: f32) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: instruction }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let started = Instant::now();
        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| self.map_send_error(e))?;
        debug!("Gemini replied {} in {}ms", status, started.elapsed().as_millis());

        if !status.is_success() {
            warn!("Gemini request failed with status {}", status);
            return Err(BackendError::from_status(status.as_u16(), text));
        }

        extract_text(&text)
    }

    fn name(&self) -> &str {
        &self.settings.model
    }
}

/// Pull the generated text out of a `generateContent` reply body.
fn extract_text(body: &str) -> Result<String> {
    let reply: GenerateResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;

    let text: String = reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BackendError::EmptyReply);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "[{\"a\": "}, {"text": "1}]"}], "role": "model"},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(extract_text(body).unwrap(), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let err = extract_text(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, BackendError::EmptyReply));
    }

    #[test]
    fn test_extract_text_rejects_garbage() {
        let err = extract_text("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = GeminiBackend::new(GeminiSettings::new("  ", "gemini-test"));
        assert!(matches!(result, Err(BackendError::Auth(_))));
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let settings = GeminiSettings::new("key", "gemini-test")
            .with_endpoint("http://localhost:8080/v1beta/");
        let backend = GeminiBackend::new(settings).unwrap();
        assert_eq!(
            backend.url(),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hola" }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hola");
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
    }
}
