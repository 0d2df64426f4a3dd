//! Context preparation for an LLM call.
//!
//! Runs a tailoring strategy against the input budget of a [`TokenBudget`] and
//! reports what the prepared window costs.

use crate::budget::counter::{fallback_estimate, TokenCounter};
use crate::budget::strategy::TailoringStrategy;
use crate::budget::types::{PreparedContext, TailorError, TokenBudget, TokenUsageBreakdown};
use crate::message::{Message, Role};

/// Prepare messages for an LLM call with budget enforcement.
///
/// The caller's messages are not modified; the full history stays with the
/// caller and only the returned window is sent to the model.
///
/// # Example
///
/// ```ignore
/// let registry = ContextWindowRegistry::with_defaults();
/// let budget = TokenBudget::resolve(&registry, "gpt-4o", None);
/// let counter: SharedTokenCounter = Arc::new(HeuristicTokenCounter::default());
/// let strategy = StrategyKind::MiddleOut.build(counter.clone());
///
/// let prepared = prepare_context(&history, &budget, strategy.as_ref(), counter.as_ref())?;
/// tracing::info!("{}", prepared.token_usage.to_log_string());
/// ```
pub fn prepare_context(
    messages: &[Message],
    budget: &TokenBudget,
    strategy: &dyn TailoringStrategy,
    counter: &dyn TokenCounter,
) -> Result<PreparedContext, TailorError> {
    let available = budget.available_input_tokens();
    let prepared_messages = strategy.tailor_messages(messages, available)?;

    let (system, conversation): (Vec<&Message>, Vec<&Message>) = prepared_messages
        .iter()
        .partition(|m| m.role == Role::System);
    let system_tokens = count_refs(counter, &system);
    let conversation_tokens = count_refs(counter, &conversation);
    let total_tokens = system_tokens.saturating_add(conversation_tokens);

    let token_usage = TokenUsageBreakdown {
        system_tokens,
        conversation_tokens,
        total_tokens,
        budget_limit: available,
    };

    let messages_removed = messages.len() - prepared_messages.len();
    let over_budget = total_tokens > available;
    if over_budget {
        tracing::warn!(
            "[{}] Prepared context exceeds budget: {}",
            strategy.name(),
            token_usage.to_log_string()
        );
    } else {
        tracing::debug!("[{}] {}", strategy.name(), token_usage.to_log_string());
    }

    Ok(PreparedContext {
        messages: prepared_messages,
        token_usage,
        truncation_occurred: messages_removed > 0,
        messages_removed,
        over_budget,
    })
}

fn count_refs(counter: &dyn TokenCounter, messages: &[&Message]) -> u32 {
    messages
        .iter()
        .map(|m| {
            counter
                .count_tokens(m)
                .unwrap_or_else(|_| fallback_estimate(m))
        })
        .fold(0u32, u32::saturating_add)
}
