//! Locally network-served model backend (Ollama).
//!
//! Talks to an Ollama server's non-streaming `/api/chat` endpoint. The
//! server runs the model; this adapter only moves text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::trait_def::{BackendError, GenerateRequest, ModelBackend};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Backend adapter for a model served over the local network by Ollama.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: Option<&str>, model: Option<&str>) -> Self {
        Self {
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).to_owned(),
            model: model.unwrap_or(DEFAULT_MODEL).to_owned(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let payload = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: &request.system,
                },
                OllamaMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            stream: false,
            options: json!({
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }),
        };

        debug!(model = %self.model, url = %url, "sending ollama chat request");

        let send = self.client.post(&url).json(&payload).send();

        let response = tokio::time::timeout(request.timeout, send)
            .await
            .map_err(|_| BackendError::timeout(self.name(), request.timeout))?
            .map_err(|e| BackendError::unavailable(self.name(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::unavailable(
                self.name(),
                format!("HTTP {status}: {body}"),
            ));
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::unavailable(self.name(), format!("bad response body: {e}")))?;

        Ok(parsed.message.content)
    }
}
