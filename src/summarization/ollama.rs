use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{PromptTemplates, SummarizationClient, SummarizeError, SummaryMode};

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Summarization client that talks to a local Ollama runtime.
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
    templates: PromptTemplates,
}

impl OllamaSummarizationClient {
    /// Construct a client whose requests give up after `timeout`.
    pub fn new(templates: PromptTemplates, timeout: Duration) -> Result<Self, SummarizeError> {
        let http = Client::builder()
            .user_agent("rustysum/ollama")
            .timeout(timeout)
            .build()
            .map_err(|error| {
                SummarizeError::provider(format!("failed to build Ollama HTTP client: {error}"))
            })?;
        Ok(Self {
            http,
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            templates,
        })
    }

    /// Point the client at a different Ollama runtime.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn summarize(&self, text: &str, mode: SummaryMode) -> Result<String, SummarizeError> {
        let prompt = self.templates.render(text, mode)?;
        let payload = json!({
            "model": self.model,
            "system": prompt.system,
            "prompt": prompt.user,
            "stream": false,
            "options": {
                // Lower temperature for deterministic summaries.
                "temperature": 0.1,
            }
        });

        tracing::debug!(
            mode = mode.as_str(),
            model = %self.model,
            input_chars = text.len(),
            "Sending request to Ollama"
        );

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| SummarizeError::from_transport("Ollama", error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizeError::provider(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::provider(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                SummarizeError::Timeout
            } else {
                SummarizeError::provider(format!("failed to decode Ollama response: {error}"))
            }
        })?;

        if !body.done {
            return Err(SummarizeError::provider(
                "Ollama response incomplete (streaming not supported)",
            ));
        }

        let summary = body.response.trim();
        if summary.is_empty() {
            return Err(SummarizeError::provider("Ollama returned an empty summary"));
        }
        Ok(summary.to_string())
    }
}
