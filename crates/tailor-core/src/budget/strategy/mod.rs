//! Tailoring strategies: fit a conversation into a token budget.
//!
//! Every strategy runs the same skeleton and differs only in which part of the
//! free zone (the messages between the preserved head and tail) it keeps:
//!
//! 1. Empty input returns an empty vector.
//! 2. Preserved head (leading system messages) and tail (last turn) are
//!    computed, the tail taking priority on overlap.
//! 3. Input that already fits is returned as a copy.
//! 4. If the preserved segments alone reach the budget, only they are
//!    returned, even though they may not fit. Dropping the instructions or the
//!    triggering request is worse than a small overrun.
//! 5. Otherwise the strategy picks the kept part of the free zone by binary
//!    search over prefix sums.
//! 6. Head, kept messages and tail are concatenated in their original order
//!    and leading orphan tool messages are removed.

pub mod head_out;
pub mod middle_out;
pub mod tail_out;

pub use head_out::HeadOut;
pub use middle_out::MiddleOut;
pub use tail_out::TailOut;

use crate::budget::counter::{SharedTokenCounter, TokenCounter};
use crate::budget::prefix_sum::PrefixSum;
use crate::budget::segments::{assemble, build_preserved_only_result, strip_leading_tool_messages};
use crate::budget::types::{PreservedSegments, TailorError};
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Trims a conversation so that it fits a token budget.
pub trait TailoringStrategy: Send + Sync {
    /// Short identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Return a new message list whose estimated cost is at most `max_tokens`,
    /// unless the preserved head and tail alone exceed it.
    ///
    /// The input is never modified.
    fn tailor_messages(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<Vec<Message>, TailorError>;
}

/// The kept part of a free zone, in absolute indices: messages
/// `zone.start..front_end` and `back_start..zone.end` survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cut {
    pub front_end: usize,
    pub back_start: usize,
}

/// Chooses the surviving part of the free zone.
pub(crate) trait CutPolicy {
    /// `remaining` is always at least one token.
    fn select(&self, prefix: &PrefixSum, zone: Range<usize>, remaining: u32) -> Cut;
}

/// Shared skeleton behind every strategy.
pub(crate) fn tailor_with(
    counter: &dyn TokenCounter,
    policy: &dyn CutPolicy,
    strategy: &'static str,
    messages: &[Message],
    max_tokens: u32,
) -> Result<Vec<Message>, TailorError> {
    if messages.is_empty() {
        return Ok(Vec::new());
    }

    let len = messages.len();
    let segments = PreservedSegments::compute(messages);
    let prefix = PrefixSum::build(counter, messages);

    let total = prefix.range_sum(0, len)?;
    if total <= max_tokens {
        tracing::debug!(
            "[{}] {} messages ({} tokens) fit budget {}",
            strategy,
            len,
            total,
            max_tokens
        );
        return Ok(strip_leading_tool_messages(messages.to_vec()));
    }

    let tail_start = segments.tail_start(len);
    let preserved_tokens = prefix
        .span(0..segments.head)
        .saturating_add(prefix.span(tail_start..len));
    if preserved_tokens >= max_tokens {
        tracing::warn!(
            "[{}] Preserved messages ({} tokens) reach budget {}, returning them over budget",
            strategy,
            preserved_tokens,
            max_tokens
        );
        return Ok(build_preserved_only_result(
            messages,
            segments.head,
            segments.tail,
        ));
    }

    let remaining = max_tokens - preserved_tokens;
    let zone = segments.head..tail_start;
    let cut = policy.select(&prefix, zone.clone(), remaining);
    debug_assert!(zone.start <= cut.front_end && cut.front_end <= cut.back_start);
    debug_assert!(cut.back_start <= zone.end);

    tracing::debug!(
        "[{}] Keeping {}..{} and {}..{} of free zone {}..{} ({} tokens left)",
        strategy,
        zone.start,
        cut.front_end,
        cut.back_start,
        zone.end,
        zone.start,
        zone.end,
        remaining
    );

    Ok(assemble(
        messages,
        segments,
        &messages[zone.start..cut.front_end],
        &messages[cut.back_start..zone.end],
    ))
}

/// Strategy selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Evict the oldest free-zone messages first.
    #[default]
    HeadOut,
    /// Evict the newest free-zone messages first.
    TailOut,
    /// Keep both ends of the free zone and evict its interior.
    MiddleOut,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::HeadOut, Self::TailOut, Self::MiddleOut];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadOut => "head_out",
            Self::TailOut => "tail_out",
            Self::MiddleOut => "middle_out",
        }
    }

    pub fn build(self, counter: SharedTokenCounter) -> Box<dyn TailoringStrategy> {
        match self {
            Self::HeadOut => Box::new(HeadOut::new(counter)),
            Self::TailOut => Box::new(TailOut::new(counter)),
            Self::MiddleOut => Box::new(MiddleOut::new(counter)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "head_out" | "headout" | "head" => Ok(Self::HeadOut),
            "tail_out" | "tailout" | "tail" => Ok(Self::TailOut),
            "middle_out" | "middleout" | "middle" => Ok(Self::MiddleOut),
            other => Err(format!(
                "Unknown strategy '{}', expected one of: head_out, tail_out, middle_out",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::counter::HeuristicTokenCounter;
    use std::sync::Arc;

    #[test]
    fn parses_strategy_names() {
        assert_eq!("head_out".parse::<StrategyKind>(), Ok(StrategyKind::HeadOut));
        assert_eq!("Tail-Out".parse::<StrategyKind>(), Ok(StrategyKind::TailOut));
        assert_eq!("middle".parse::<StrategyKind>(), Ok(StrategyKind::MiddleOut));
        assert!("sideways".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>(), Ok(kind));
        }
    }

    #[test]
    fn deserializes_snake_case() {
        let kind: StrategyKind = serde_json::from_str("\"middle_out\"").unwrap();
        assert_eq!(kind, StrategyKind::MiddleOut);
    }

    #[test]
    fn build_selects_matching_strategy() {
        let counter: SharedTokenCounter = Arc::new(HeuristicTokenCounter::default());
        for kind in StrategyKind::ALL {
            assert_eq!(kind.build(counter.clone()).name(), kind.as_str());
        }
    }
}
