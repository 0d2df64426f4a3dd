//! Token counting for budget management.
//!
//! Provides a cheap rune-based estimate (runes/4, rounded up per field). A real
//! tokenizer can be swapped in behind [`TokenCounter`] as long as it stays
//! deterministic, non-negative and monotonic in text length.

use crate::budget::types::{check_range, CounterError, TailorError};
use crate::message::Message;
use std::sync::Arc;

/// Default characters (runes) per token.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Trait for token counting implementations.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in a single message.
    fn count_tokens(&self, message: &Message) -> Result<u32, CounterError>;

    /// Count tokens over `messages[start..end]`.
    ///
    /// Fails with [`TailorError::InvalidRange`] when `end > messages.len()` or
    /// `start >= end`.
    fn count_tokens_range(
        &self,
        messages: &[Message],
        start: usize,
        end: usize,
    ) -> Result<u32, TailorError> {
        check_range(start, end, messages.len())?;
        messages[start..end].iter().try_fold(0u32, |acc, m| {
            Ok(acc.saturating_add(self.count_tokens(m)?))
        })
    }

    /// Count tokens in multiple messages, substituting the rune estimate for
    /// any message the counter cannot price.
    fn count_messages(&self, messages: &[Message]) -> u32 {
        messages
            .iter()
            .map(|m| {
                self.count_tokens(m)
                    .unwrap_or_else(|_| fallback_estimate(m))
            })
            .fold(0u32, u32::saturating_add)
    }
}

/// Heuristic token counter using rune-based estimation.
///
/// Each text field (content, reasoning content, text parts) costs
/// `ceil(runes / chars_per_token)`. A message with non-empty `content` costs
/// at least one token; a message whose `content` is empty is not floored, so
/// an empty placeholder costs zero.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    chars_per_token: usize,
}

impl HeuristicTokenCounter {
    /// Create a counter with a custom ratio. A ratio of zero is treated as one.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    /// Count tokens in a plain text string.
    pub fn count_text(&self, text: &str) -> u32 {
        runes_to_tokens(text.chars().count(), self.chars_per_token)
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, message: &Message) -> Result<u32, CounterError> {
        let total = message
            .text_fields()
            .map(|text| self.count_text(text))
            .fold(0u32, u32::saturating_add);

        if message.content.is_empty() {
            Ok(total)
        } else {
            Ok(total.max(1))
        }
    }
}

/// Estimate used when a counter fails for a message: all text runes / 4,
/// rounded up.
pub fn fallback_estimate(message: &Message) -> u32 {
    let runes: usize = message.text_fields().map(|t| t.chars().count()).sum();
    runes_to_tokens(runes, DEFAULT_CHARS_PER_TOKEN)
}

fn runes_to_tokens(runes: usize, chars_per_token: usize) -> u32 {
    u32::try_from(runes.div_ceil(chars_per_token)).unwrap_or(u32::MAX)
}

/// Arc-wrapped token counter for easy sharing.
pub type SharedTokenCounter = Arc<dyn TokenCounter>;
