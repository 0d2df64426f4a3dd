use super::{tailor_with, Cut, CutPolicy, TailoringStrategy};
use crate::budget::counter::{HeuristicTokenCounter, SharedTokenCounter};
use crate::budget::prefix_sum::PrefixSum;
use crate::budget::types::TailorError;
use crate::message::Message;
use std::ops::Range;
use std::sync::Arc;

/// Drops the newest free-zone messages first.
///
/// Keeps the longest run of free-zone messages right after the preserved
/// head, e.g. the original task description and early exploration.
#[derive(Clone)]
pub struct TailOut {
    counter: SharedTokenCounter,
}

impl TailOut {
    pub fn new(counter: SharedTokenCounter) -> Self {
        Self { counter }
    }
}

impl Default for TailOut {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicTokenCounter::default()))
    }
}

impl CutPolicy for TailOut {
    fn select(&self, prefix: &PrefixSum, zone: Range<usize>, remaining: u32) -> Cut {
        Cut {
            front_end: prefix.longest_prefix_within(zone.clone(), remaining),
            back_start: zone.end,
        }
    }
}

impl TailoringStrategy for TailOut {
    fn name(&self) -> &'static str {
        "tail_out"
    }

    fn tailor_messages(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<Vec<Message>, TailorError> {
        tailor_with(self.counter.as_ref(), self, self.name(), messages, max_tokens)
    }
}
