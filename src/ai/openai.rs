//! OpenAI-compatible HTTP implementation of [`Summarizer`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::summarizer::{ChatMessage, Summarizer, SummaryRequest};
use crate::error::RepomonError;
use crate::retry::{RateLimitWait, parse_rate_limit_wait};

/// GitHub Models inference endpoint.
pub const DEFAULT_BASE_URL: &str = "https://models.inference.ai.azure.com";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ERROR_BODY_LIMIT: usize = 160;

/// Configuration for [`OpenAiSummarizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Base API URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bearer token.
    pub api_key: String,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Configuration for the default endpoint and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiSummarizer {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Configuration`] when the API key is blank or
    /// the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, RepomonError> {
        if config.api_key.trim().is_empty() {
            return Err(RepomonError::Configuration {
                message: concat!(
                    "summarization API key is required (use --ai-api-key, ",
                    "REPOMON_AI_API_KEY, OPENAI_API_KEY, or a GitHub token)"
                )
                .to_owned(),
            });
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| RepomonError::Configuration {
                message: format!("failed to configure summarization HTTP client: {error}"),
            })?;
        Ok(Self { config, client })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn complete(&self, request: &SummaryRequest) -> Result<String, RepomonError> {
        let payload = ChatCompletionsRequest {
            model: self.config.model.as_str(),
            messages: &request.messages,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| RepomonError::Network {
                message: format!("summarization request transport failed: {error}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let decoded: ChatCompletionsResponse =
            response
                .json()
                .await
                .map_err(|error| RepomonError::Summarization {
                    message: format!("response JSON decoding failed: {error}"),
                })?;

        decoded
            .choices
            .first()
            .and_then(|choice| parse_content_value(&choice.message.content))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| RepomonError::Summarization {
                message: "response did not contain assistant text".to_owned(),
            })
    }
}

fn classify_failure(status: StatusCode, body: &str) -> RepomonError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return match parse_rate_limit_wait(body) {
            RateLimitWait::RetryAfter(wait) => RepomonError::RateLimited {
                retry_after: Some(wait),
                message: truncate_for_message(body, ERROR_BODY_LIMIT),
            },
            RateLimitWait::Exhausted { wait_seconds } => {
                RepomonError::QuotaExhausted { wait_seconds }
            }
            RateLimitWait::Unknown => RepomonError::RateLimited {
                retry_after: None,
                message: truncate_for_message(body, ERROR_BODY_LIMIT),
            },
        };
    }

    RepomonError::Api {
        status: Some(status.as_u16()),
        message: format!(
            "summarization request failed: {}",
            truncate_for_message(body, ERROR_BODY_LIMIT)
        ),
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: ChatContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

#[derive(Debug, Deserialize)]
struct ChatContentPart {
    text: Option<String>,
    content: Option<String>,
}

fn parse_content_value(content: &ChatContent) -> Option<&str> {
    match content {
        ChatContent::Text(text) => Some(text.as_str()),
        ChatContent::Parts(parts) => parts
            .iter()
            .find_map(|part| part.text.as_deref().or(part.content.as_deref())),
    }
}

fn truncate_for_message(message: &str, max_chars: usize) -> String {
    let mut output: String = message.chars().take(max_chars).collect();
    if message.chars().nth(max_chars).is_some() {
        output.push_str("...");
    }
    output
}
