//! AI completion providers
//!
//! The dispatch core only depends on the `CompletionProvider` trait; the
//! OpenAI-compatible HTTP implementation lives in `openai`.

mod openai;

use async_trait::async_trait;

pub use openai::OpenAiProvider;

use crate::Result;

/// Role of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn in the prompt sequence sent to the provider
#[derive(Debug, Clone, serde::Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    /// Build a system turn
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An AI chat-completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete the message sequence, bounded by `max_tokens`
    ///
    /// # Errors
    ///
    /// Returns `Error::RateLimited` on provider rate limits and
    /// `Error::Upstream` on API or connection failures.
    async fn complete(&self, messages: &[PromptMessage], max_tokens: u32) -> Result<String>;
}
