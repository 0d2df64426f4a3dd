//! Core types for token budget management.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::budget::limits::ContextWindowRegistry;
use crate::message::Message;

/// Default safety margin as a percentage of context window (1%).
const DEFAULT_SAFETY_MARGIN_PERCENT: f64 = 0.01;
/// Minimum safety margin in tokens.
const MIN_SAFETY_MARGIN: u32 = 100;
/// Maximum safety margin in tokens.
const MAX_SAFETY_MARGIN: u32 = 2000;
/// Most providers cap a single completion at 16k.
const MAX_OUTPUT_CAP: u32 = 16_384;

/// Token budget derived from a model's context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Maximum context window size for the model (input + output)
    pub max_context_tokens: u32,
    /// Tokens reserved for the model's completion
    pub max_output_tokens: u32,
    /// Safety margin for tokenizer estimation errors
    #[serde(default = "default_safety_margin")]
    pub safety_margin: u32,
}

fn default_safety_margin() -> u32 {
    1000
}

impl TokenBudget {
    pub fn new(max_context_tokens: u32, max_output_tokens: u32) -> Self {
        Self {
            max_context_tokens,
            max_output_tokens,
            safety_margin: calculate_safety_margin(max_context_tokens),
        }
    }

    pub fn with_safety_margin(
        max_context_tokens: u32,
        max_output_tokens: u32,
        safety_margin: u32,
    ) -> Self {
        Self {
            max_context_tokens,
            max_output_tokens,
            safety_margin,
        }
    }

    /// Budget for a context window with the default completion reserve.
    pub fn for_window(max_context_tokens: u32) -> Self {
        Self::new(
            max_context_tokens,
            calculate_max_output_tokens(max_context_tokens),
        )
    }

    /// Resolve the window for `model` and reserve `completion_reserve` tokens
    /// for the answer, falling back to the default reserve when `None`.
    pub fn resolve(
        registry: &ContextWindowRegistry,
        model: &str,
        completion_reserve: Option<u32>,
    ) -> Self {
        let window = registry.resolve(model);
        match completion_reserve {
            Some(reserve) => Self::new(window, reserve),
            None => Self::for_window(window),
        }
    }

    /// The budget handed to a tailoring strategy.
    pub fn available_input_tokens(&self) -> u32 {
        self.max_context_tokens
            .saturating_sub(self.max_output_tokens)
            .saturating_sub(self.safety_margin)
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::for_window(128_000)
    }
}

/// 1% of the window, clamped to [MIN_SAFETY_MARGIN, MAX_SAFETY_MARGIN].
fn calculate_safety_margin(max_context_tokens: u32) -> u32 {
    let margin = (max_context_tokens as f64 * DEFAULT_SAFETY_MARGIN_PERCENT) as u32;
    margin.clamp(MIN_SAFETY_MARGIN, MAX_SAFETY_MARGIN)
}

/// Reserve ~25% of the window for output, capped at MAX_OUTPUT_CAP.
fn calculate_max_output_tokens(max_context_tokens: u32) -> u32 {
    let output_tokens = (max_context_tokens as f64 * 0.25) as u32;
    output_tokens.min(MAX_OUTPUT_CAP)
}

/// How many messages at each end of a conversation must survive tailoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreservedSegments {
    /// Leading run of system messages.
    pub head: usize,
    /// Last conversational turn, counted from the end.
    pub tail: usize,
}

impl PreservedSegments {
    /// Clip so that `head + tail <= len`. The tail is never reduced below
    /// `min(tail, len)`; any overlap is taken out of the head.
    pub fn clipped(head: usize, tail: usize, len: usize) -> Self {
        let tail = tail.min(len);
        let head = head.min(len - tail);
        Self { head, tail }
    }

    pub fn is_empty(&self) -> bool {
        self.head == 0 && self.tail == 0
    }

    /// Index of the first preserved tail message in a slice of `len` messages.
    pub fn tail_start(&self, len: usize) -> usize {
        len - self.tail
    }
}

/// Result of context preparation with budget enforcement.
#[derive(Debug, Clone)]
pub struct PreparedContext {
    /// Messages to send to the model
    pub messages: Vec<Message>,
    pub token_usage: TokenUsageBreakdown,
    /// Whether any message was dropped
    pub truncation_occurred: bool,
    pub messages_removed: usize,
    /// Preserved content alone did not fit and was sent anyway
    pub over_budget: bool,
}

/// Detailed token usage breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsageBreakdown {
    /// Tokens used by system message(s)
    pub system_tokens: u32,
    /// Tokens used by every non-system message
    pub conversation_tokens: u32,
    pub total_tokens: u32,
    /// Budget limit for input tokens
    pub budget_limit: u32,
}

impl TokenUsageBreakdown {
    /// Calculate percentage of budget used.
    pub fn usage_percentage(&self) -> f64 {
        if self.budget_limit == 0 {
            return 0.0;
        }
        (self.total_tokens as f64 / self.budget_limit as f64) * 100.0
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "context: ~{} tokens ({:.0}% of {}; system {}, conversation {})",
            self.total_tokens,
            self.usage_percentage(),
            self.budget_limit,
            self.system_tokens,
            self.conversation_tokens,
        )
    }
}

/// A token counter could not price a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to count tokens for message {message_id}: {reason}")]
pub struct CounterError {
    pub message_id: String,
    pub reason: String,
}

impl CounterError {
    pub fn new(message_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by token counting and tailoring.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TailorError {
    /// Range does not describe a non-empty window of the message slice
    #[error("Invalid range [{start}, {end}) for {len} messages")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error(transparent)]
    Counter(#[from] CounterError),
}

/// Validate `[start, end)` against a slice of `len` messages.
pub(crate) fn check_range(start: usize, end: usize, len: usize) -> Result<(), TailorError> {
    if end > len || start >= end {
        return Err(TailorError::InvalidRange { start, end, len });
    }
    Ok(())
}
