use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{PromptTemplates, SummarizationClient, SummarizeError, SummaryMode};

const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
const REFERER: &str = "http://localhost:8000";
const TITLE: &str = "Text Summarizer";

/// Summarization client backed by the OpenRouter chat completions API.
pub struct OpenRouterSummarizationClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    templates: PromptTemplates,
}

impl OpenRouterSummarizationClient {
    /// Construct a client whose requests give up after `timeout`.
    pub fn new(
        api_key: String,
        templates: PromptTemplates,
        timeout: Duration,
    ) -> Result<Self, SummarizeError> {
        let http = Client::builder()
            .user_agent("rustysum/openrouter")
            .timeout(timeout)
            .build()
            .map_err(|error| {
                SummarizeError::provider(format!("failed to build OpenRouter HTTP client: {error}"))
            })?;
        Ok(Self {
            http,
            base_url: DEFAULT_OPENROUTER_URL.to_string(),
            api_key,
            model: DEFAULT_OPENROUTER_MODEL.to_string(),
            templates,
        })
    }

    /// Point the client at a different OpenRouter-compatible endpoint.
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
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap, SummarizeError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| SummarizeError::provider("invalid OpenRouter API key"))?,
        );
        headers.insert("http-referer", HeaderValue::from_static(REFERER));
        headers.insert("x-title", HeaderValue::from_static(TITLE));
        Ok(headers)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[async_trait]
impl SummarizationClient for OpenRouterSummarizationClient {
    async fn summarize(&self, text: &str, mode: SummaryMode) -> Result<String, SummarizeError> {
        let prompt = self.templates.render(text, mode)?;
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        tracing::debug!(
            mode = mode.as_str(),
            model = %self.model,
            input_chars = text.len(),
            "Sending request to OpenRouter"
        );

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|error| SummarizeError::from_transport("OpenRouter", error))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(SummarizeError::provider(format!(
                "OpenRouter returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                SummarizeError::Timeout
            } else {
                SummarizeError::provider(format!("failed to decode OpenRouter response: {error}"))
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SummarizeError::provider("unexpected response format from OpenRouter"))?;

        let content = content.trim();
        if content.is_empty() {
            return Err(SummarizeError::provider("OpenRouter returned an empty summary"));
        }
        Ok(content.to_string())
    }
}
