use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Default word budget per chunk handed to the summarization provider.
pub const DEFAULT_MAX_WORDS_PER_CHUNK: usize = 60_000;
/// Default provider call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Merge inputs above this token estimate are logged as exceeding the expected budget.
pub const DEFAULT_MERGE_INPUT_WARN_TOKENS: usize = 100_000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the summarizer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend used to produce chunk and merge summaries.
    pub summarization_provider: SummarizationProvider,
    /// Bearer credential for OpenRouter; required when that provider is selected.
    pub openrouter_api_key: Option<String>,
    /// Optional override for the OpenRouter API base URL.
    pub openrouter_base_url: Option<String>,
    /// Optional override for the local Ollama runtime URL.
    pub ollama_url: Option<String>,
    /// Model identifier passed to the provider; each provider has its own default.
    pub summarizer_model: Option<String>,
    /// Per-call timeout for provider requests.
    pub summarizer_timeout: Duration,
    /// Number of chunk summaries allowed in flight at once.
    pub summarizer_concurrency: usize,
    /// Word budget per chunk.
    pub max_words_per_chunk: usize,
    /// Token estimate above which a merge input triggers a warning.
    pub merge_input_warn_tokens: usize,
    /// Optional file replacing the default chunk summary instructions.
    pub chunk_prompt_file: Option<PathBuf>,
    /// Source document location.
    pub input_path: PathBuf,
    /// Destination for the final summary.
    pub output_path: PathBuf,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hosted OpenRouter chat completions API.
    OpenRouter,
    /// Local Ollama runtime.
    Ollama,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent so that an empty `KEY=` line in a dotenv file falls
    /// back to the default instead of failing validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let summarization_provider = match optional("SUMMARIZATION_PROVIDER") {
            Some(value) => value.parse::<SummarizationProvider>().map_err(|()| {
                ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
            })?,
            None => SummarizationProvider::OpenRouter,
        };

        let openrouter_api_key = optional("OPENROUTER_API_KEY");
        if summarization_provider == SummarizationProvider::OpenRouter
            && openrouter_api_key.is_none()
        {
            return Err(ConfigError::MissingVariable(
                "OPENROUTER_API_KEY".to_string(),
            ));
        }

        let max_words_per_chunk = parse_optional(&optional, "MAX_WORDS_PER_CHUNK")?
            .unwrap_or(DEFAULT_MAX_WORDS_PER_CHUNK);
        if max_words_per_chunk == 0 {
            return Err(ConfigError::InvalidValue("MAX_WORDS_PER_CHUNK".to_string()));
        }

        let timeout_secs: u64 = parse_optional(&optional, "SUMMARIZER_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SUMMARIZER_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(Self {
            summarization_provider,
            openrouter_api_key,
            openrouter_base_url: optional("OPENROUTER_BASE_URL"),
            ollama_url: optional("OLLAMA_URL"),
            summarizer_model: optional("SUMMARIZER_MODEL"),
            summarizer_timeout: Duration::from_secs(timeout_secs),
            summarizer_concurrency: parse_optional(&optional, "SUMMARIZER_CONCURRENCY")?
                .unwrap_or(1usize)
                .max(1),
            max_words_per_chunk,
            merge_input_warn_tokens: parse_optional(&optional, "MERGE_INPUT_WARN_TOKENS")?
                .unwrap_or(DEFAULT_MERGE_INPUT_WARN_TOKENS),
            chunk_prompt_file: optional("SUMMARIZER_CHUNK_PROMPT_FILE").map(PathBuf::from),
            input_path: optional("RUSTYSUM_INPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("input.txt")),
            output_path: optional("RUSTYSUM_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output.txt")),
        })
    }
}

fn parse_optional<T, F>(optional: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, if [`init_config`] has run.
pub fn get_config() -> Option<&'static Config> {
    CONFIG.get()
}

/// Load dotenv files and the environment, then install the result in the global cache.
///
/// `.env.local` is read first so that its values win over `.env`; neither file is required.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        provider = ?config.summarization_provider,
        model = ?config.summarizer_model,
        max_words_per_chunk = config.max_words_per_chunk,
        concurrency = config.summarizer_concurrency,
        timeout_secs = config.summarizer_timeout.as_secs(),
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_api_key_is_set() {
        let config = Config::from_lookup(lookup(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();
        assert_eq!(
            config.summarization_provider,
            SummarizationProvider::OpenRouter
        );
        assert_eq!(config.max_words_per_chunk, DEFAULT_MAX_WORDS_PER_CHUNK);
        assert_eq!(config.summarizer_timeout, Duration::from_secs(120));
        assert_eq!(config.summarizer_concurrency, 1);
        assert_eq!(config.input_path, PathBuf::from("input.txt"));
        assert_eq!(config.output_path, PathBuf::from("output.txt"));
    }

    #[test]
    fn openrouter_requires_api_key() {
        let error = Config::from_lookup(lookup(&[("OPENROUTER_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(error, ConfigError::MissingVariable(key) if key == "OPENROUTER_API_KEY"));
    }

    #[test]
    fn ollama_does_not_need_api_key() {
        let config = Config::from_lookup(lookup(&[
            ("SUMMARIZATION_PROVIDER", "Ollama"),
            ("OLLAMA_URL", "http://localhost:11434"),
        ]))
        .unwrap();
        assert_eq!(config.summarization_provider, SummarizationProvider::Ollama);
        assert_eq!(config.ollama_url.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let error = Config::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("MAX_WORDS_PER_CHUNK", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "MAX_WORDS_PER_CHUNK"));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let error = Config::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("SUMMARIZER_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "SUMMARIZER_TIMEOUT_SECS"));
    }

    #[test]
    fn concurrency_is_clamped_to_one() {
        let config = Config::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("SUMMARIZER_CONCURRENCY", "0"),
        ]))
        .unwrap();
        assert_eq!(config.summarizer_concurrency, 1);
    }

    #[test]
    fn unknown_provider_is_invalid() {
        let error =
            Config::from_lookup(lookup(&[("SUMMARIZATION_PROVIDER", "bard")])).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "SUMMARIZATION_PROVIDER"));
    }
}
