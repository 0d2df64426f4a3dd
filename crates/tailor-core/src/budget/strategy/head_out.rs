use super::{tailor_with, Cut, CutPolicy, TailoringStrategy};
use crate::budget::counter::{HeuristicTokenCounter, SharedTokenCounter};
use crate::budget::prefix_sum::PrefixSum;
use crate::budget::types::TailorError;
use crate::message::Message;
use std::ops::Range;
use std::sync::Arc;

/// Drops the oldest free-zone messages first.
///
/// Keeps the longest run of free-zone messages ending right before the
/// preserved tail, so recent history survives.
#[derive(Clone)]
pub struct HeadOut {
    counter: SharedTokenCounter,
}

impl HeadOut {
    pub fn new(counter: SharedTokenCounter) -> Self {
        Self { counter }
    }
}

impl Default for HeadOut {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicTokenCounter::default()))
    }
}

impl CutPolicy for HeadOut {
    fn select(&self, prefix: &PrefixSum, zone: Range<usize>, remaining: u32) -> Cut {
        Cut {
            front_end: zone.start,
            back_start: prefix.longest_suffix_within(zone, remaining),
        }
    }
}

impl TailoringStrategy for HeadOut {
    fn name(&self) -> &'static str {
        "head_out"
    }

    fn tailor_messages(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<Vec<Message>, TailorError> {
        tailor_with(self.counter.as_ref(), self, self.name(), messages, max_tokens)
    }
}
