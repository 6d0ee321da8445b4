//! Abstractions for generating summaries through external language-model providers.
//!
//! The processing layer only sees [`SummarizationClient`]: one call summarizes one unit of
//! text, either a chunk of the source document or the divider-joined chunk summaries that
//! still need merging. Each provider performs exactly one outbound request per call and never
//! retries; retry policy belongs to whoever wraps the whole pipeline.

mod ollama;
mod openrouter;
mod prompts;

pub use ollama::OllamaSummarizationClient;
pub use openrouter::OpenRouterSummarizationClient;
pub use prompts::{PromptTemplates, RenderedPrompt};

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a single summarization call.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Empty or whitespace-only text was supplied; no request was issued.
    #[error("no text provided for summarization")]
    InvalidInput,
    /// Provider did not answer within the configured bound.
    #[error("summarization request timed out")]
    Timeout,
    /// Provider was unreachable or returned an error or malformed response.
    #[error("summarization provider failed: {details}")]
    ProviderFailure {
        /// Human-readable description of what went wrong.
        details: String,
    },
}

impl SummarizeError {
    pub(crate) fn provider(details: impl Into<String>) -> Self {
        Self::ProviderFailure {
            details: details.into(),
        }
    }

    /// Classify a transport error, separating timeouts from other failures.
    pub(crate) fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::provider(format!("failed to reach {provider}: {error}"))
        }
    }
}

/// Which instructions accompany the text sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryMode {
    /// Summarize one chunk of the original document.
    Chunk,
    /// Combine several divider-separated chunk summaries into one.
    Merge,
}

impl SummaryMode {
    /// Short label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chunk => "chunk",
            Self::Merge => "merge",
        }
    }
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Summarize `text` with the instructions for `mode`.
    async fn summarize(&self, text: &str, mode: SummaryMode) -> Result<String, SummarizeError>;
}

/// Build the summarization client selected by configuration.
///
/// Prompt templates are resolved here, once, and handed to the client as immutable values.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizeError> {
    let templates = match &config.chunk_prompt_file {
        Some(path) => {
            let instructions = std::fs::read_to_string(path).map_err(|error| {
                SummarizeError::provider(format!(
                    "failed to read chunk prompt file {}: {error}",
                    path.display()
                ))
            })?;
            PromptTemplates::default().with_chunk_instructions(instructions)
        }
        None => PromptTemplates::default(),
    };

    match config.summarization_provider {
        SummarizationProvider::OpenRouter => {
            let api_key = config.openrouter_api_key.clone().ok_or_else(|| {
                SummarizeError::provider("OPENROUTER_API_KEY is not configured")
            })?;
            let mut client =
                OpenRouterSummarizationClient::new(api_key, templates, config.summarizer_timeout)?;
            if let Some(base_url) = &config.openrouter_base_url {
                client = client.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.summarizer_model {
                client = client.with_model(model.clone());
            }
            tracing::info!(provider = "openrouter", model = client.model(), "Summarizer ready");
            Ok(Arc::new(client))
        }
        SummarizationProvider::Ollama => {
            let mut client = OllamaSummarizationClient::new(templates, config.summarizer_timeout)?;
            if let Some(base_url) = &config.ollama_url {
                client = client.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.summarizer_model {
                client = client.with_model(model.clone());
            }
            tracing::info!(provider = "ollama", model = client.model(), "Summarizer ready");
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key: &str| map.get(key).cloned()).expect("config")
    }

    #[test]
    fn builds_openrouter_client_from_config() {
        let config = config(&[("OPENROUTER_API_KEY", "sk-test")]);
        assert!(build_summarization_client(&config).is_ok());
    }

    #[test]
    fn builds_ollama_client_from_config() {
        let config = config(&[("SUMMARIZATION_PROVIDER", "ollama")]);
        assert!(build_summarization_client(&config).is_ok());
    }

    #[test]
    fn missing_prompt_file_is_reported() {
        let config = config(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("SUMMARIZER_CHUNK_PROMPT_FILE", "/nonexistent/prompt.txt"),
        ]);
        let error = build_summarization_client(&config)
            .err()
            .expect("prompt file error");
        assert!(
            matches!(error, SummarizeError::ProviderFailure { details } if details.contains("prompt file"))
        );
    }
}
