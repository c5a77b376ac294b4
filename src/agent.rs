//! AI response handler
//!
//! Builds a bounded prompt from recent conversation history, calls the
//! completion provider, and persists the exchange. Provider failures of any
//! kind collapse into a fixed apology so the dispatch loop never crashes.

use std::sync::Arc;

use crate::db::ConversationRepo;
use crate::providers::{CompletionProvider, PromptMessage};
use crate::state::SharedState;

/// Fixed reply when the provider fails
pub const APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again later.";

/// Maximum tokens a single response may spend
const MAX_TOKEN_BUDGET: u32 = 500;

/// Number of recent exchanges included in each prompt
const HISTORY_WINDOW: usize = 5;

/// AI responder shared by the chat-mention and voice paths
pub struct Responder {
    provider: Arc<dyn CompletionProvider>,
    history: ConversationRepo,
    state: SharedState,
}

impl Responder {
    /// Create a responder
    #[must_use]
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        history: ConversationRepo,
        state: SharedState,
    ) -> Self {
        Self {
            provider,
            history,
            state,
        }
    }

    /// Generate a response to `message`
    ///
    /// Never fails: provider or history errors are logged and replaced with
    /// the fixed apology. History persistence is best-effort and does not
    /// block returning the response.
    pub async fn respond(&self, message: &str) -> String {
        let personality = self.state.read().await.personality.clone();

        let history = match self.history.recent(HISTORY_WINDOW) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load conversation history");
                Vec::new()
            }
        };

        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(PromptMessage::system(personality));
        for entry in &history {
            messages.push(PromptMessage::user(entry.user_msg.clone()));
            messages.push(PromptMessage::assistant(entry.bot_msg.clone()));
        }
        messages.push(PromptMessage::user(message));

        let max_tokens = token_budget(message.split_whitespace().count(), history.len());
        tracing::debug!(max_tokens, history = history.len(), "requesting completion");

        let response = match self.provider.complete(&messages, max_tokens).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "completion failed");
                return APOLOGY.to_string();
            }
        };

        if let Err(e) = self.history.append(message, &response) {
            tracing::warn!(error = %e, "failed to persist conversation entry");
        }

        response
    }
}

/// Response token budget
///
/// Grows with prompt length and accumulated history, bounded at
/// `MAX_TOKEN_BUDGET` so short prompts with no history stay cheap.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn token_budget(word_count: usize, history_len: usize) -> u32 {
    let by_input = 100 + (word_count / 5);
    let by_history = history_len * 10;
    by_input.max(by_history).min(MAX_TOKEN_BUDGET as usize) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_short_prompt_no_history() {
        assert_eq!(token_budget(5, 0), 101);
    }

    #[test]
    fn budget_prefers_larger_input_bound() {
        assert_eq!(token_budget(50, 10), 110);
    }

    #[test]
    fn budget_caps_long_history() {
        assert_eq!(token_budget(3, 60), 500);
    }

    #[test]
    fn budget_history_dominates_when_larger() {
        // 100 + 0 vs 20 * 10
        assert_eq!(token_budget(0, 20), 200);
    }
}
