use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use funda_core::config::{LlmConfig, LlmProvider};
use funda_core::errors::ApplicationError;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, instruction: &str, input: &str) -> Result<String, ApplicationError>;
}

/// Build the model client for the configured provider, or `None` when the
/// runtime should stay fully deterministic. The vertex provider relies on
/// ambient platform credentials and is not wired in this demo build; it
/// degrades to deterministic replies as well.
pub fn build_llm_client(
    config: &LlmConfig,
) -> Result<Option<Arc<dyn LlmClient>>, ApplicationError> {
    match config.provider {
        LlmProvider::Disabled => Ok(None),
        LlmProvider::Vertex => {
            tracing::warn!(
                event_name = "agent.llm.vertex_unwired",
                "vertex provider is not wired in this build; replies stay deterministic"
            );
            Ok(None)
        }
        LlmProvider::Gemini => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| ApplicationError::Configuration("llm.api_key missing".into()))?;
            let client = GeminiClient::new(api_key, config.model.clone(), config.timeout_secs)?;
            Ok(Some(Arc::new(client)))
        }
    }
}

/// Minimal Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: SecretString,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, ApplicationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|error| {
                ApplicationError::Integration(format!("http client init failed: {error}"))
            })?;
        Ok(Self { http, api_key, model })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, instruction: &str, input: &str) -> Result<String, ApplicationError> {
        let body = json!({
            "system_instruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": input }] }],
        });

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|error| ApplicationError::Integration(format!("model call failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::Integration(format!(
                "model call returned status {status}"
            )));
        }

        let payload: Value = response.json().await.map_err(|error| {
            ApplicationError::Integration(format!("model response decode failed: {error}"))
        })?;

        let text = extract_text(&payload);
        if text.is_empty() {
            return Err(ApplicationError::Integration(
                "model response contained no text parts".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(payload: &Value) -> String {
    payload["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts.iter().filter_map(|part| part["text"].as_str()).collect::<Vec<_>>().join("")
        })
        .unwrap_or_default()
}
