//! Preserved segments and result assembly.
//!
//! The leading block of system messages holds the agent's instructions and the
//! last turn (from the most recent user message to the end) holds the request
//! being answered, including any tool-call/tool-result pairs within it. Neither
//! is ever dropped by a tailoring strategy.

use crate::budget::types::PreservedSegments;
use crate::message::{Message, Role};

/// Length of the leading run of system messages.
pub fn preserved_head_count(messages: &[Message]) -> usize {
    messages
        .iter()
        .take_while(|m| m.role == Role::System)
        .count()
}

/// Number of trailing messages that make up the last turn.
///
/// Everything from the last user message to the end; just the final message
/// when the conversation has no user message.
pub fn preserved_tail_count(messages: &[Message]) -> usize {
    if messages.is_empty() {
        return 0;
    }
    match messages.iter().rposition(|m| m.role == Role::User) {
        Some(index) => messages.len() - index,
        None => 1,
    }
}

impl PreservedSegments {
    /// Compute both counts for `messages`, clipped with tail priority.
    pub fn compute(messages: &[Message]) -> Self {
        Self::clipped(
            preserved_head_count(messages),
            preserved_tail_count(messages),
            messages.len(),
        )
    }
}

/// Result made of the preserved head and tail only.
///
/// Used when the preserved content alone does not fit the budget; the
/// returned messages may exceed it.
pub fn build_preserved_only_result(
    messages: &[Message],
    preserved_head: usize,
    preserved_tail: usize,
) -> Vec<Message> {
    let segments = PreservedSegments::clipped(preserved_head, preserved_tail, messages.len());
    if segments.is_empty() {
        return Vec::new();
    }
    assemble(messages, segments, &[], &[])
}

/// Concatenate `head ++ kept_front ++ kept_back ++ tail` into a fresh vector
/// and strip leading orphan tool messages.
pub(crate) fn assemble(
    messages: &[Message],
    segments: PreservedSegments,
    kept_front: &[Message],
    kept_back: &[Message],
) -> Vec<Message> {
    let tail_start = segments.tail_start(messages.len());
    let mut result = Vec::with_capacity(
        segments.head + kept_front.len() + kept_back.len() + segments.tail,
    );
    result.extend_from_slice(&messages[..segments.head]);
    result.extend_from_slice(kept_front);
    result.extend_from_slice(kept_back);
    result.extend_from_slice(&messages[tail_start..]);
    strip_leading_tool_messages(result)
}

/// Drop every consecutive `tool` message at the start of `messages`.
///
/// A tool result whose originating assistant tool call is not in the window
/// is rejected by most chat completion APIs.
pub fn strip_leading_tool_messages(mut messages: Vec<Message>) -> Vec<Message> {
    let orphans = messages.iter().take_while(|m| m.is_tool()).count();
    if orphans > 0 {
        tracing::warn!(
            "Dropping {} orphan tool message(s) at the start of the context window",
            orphans
        );
        messages.drain(..orphans);
    }
    messages
}
