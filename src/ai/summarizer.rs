//! Summarization collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RepomonError;

/// One chat message sent to the summarization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a message with the given role.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A rendered prompt ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    /// Conversation to complete.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature, when the prompt sets one.
    pub temperature: Option<f64>,
}

/// Produces narrative text from a rendered prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Completes `request` and returns the assistant's text.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::RateLimited`] or
    /// [`RepomonError::QuotaExhausted`] when the endpoint throttles the call,
    /// and other variants for transport or response failures.
    async fn complete(&self, request: &SummaryRequest) -> Result<String, RepomonError>;
}
