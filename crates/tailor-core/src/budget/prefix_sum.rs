//! Cumulative token counts for O(log n) budget lookups.

use crate::budget::counter::{fallback_estimate, TokenCounter};
use crate::budget::types::{check_range, TailorError};
use crate::message::Message;
use std::ops::Range;

/// `sums[i]` is the token cost of `messages[..i]`; `sums[0] == 0`.
///
/// Non-decreasing by construction, which is what makes the binary searches
/// below valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSum {
    sums: Vec<u32>,
}

impl PrefixSum {
    /// Build prefix sums over `messages`.
    ///
    /// A counter failure for one message is replaced by the rune estimate for
    /// that message and never aborts the build.
    pub fn build(counter: &dyn TokenCounter, messages: &[Message]) -> Self {
        let mut sums = Vec::with_capacity(messages.len() + 1);
        let mut running = 0u32;
        sums.push(running);
        for message in messages {
            let tokens = counter.count_tokens(message).unwrap_or_else(|err| {
                tracing::debug!("Using rune estimate: {}", err);
                fallback_estimate(message)
            });
            running = running.saturating_add(tokens);
            sums.push(running);
        }
        Self { sums }
    }

    /// Number of messages covered.
    pub fn len(&self) -> usize {
        self.sums.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cost of `messages[..index]`.
    pub fn at(&self, index: usize) -> u32 {
        self.sums[index]
    }

    /// Cost of every message.
    pub fn total(&self) -> u32 {
        self.sums[self.len()]
    }

    /// Cost of `messages[start..end]`, with the same bounds contract as
    /// [`TokenCounter::count_tokens_range`].
    pub fn range_sum(&self, start: usize, end: usize) -> Result<u32, TailorError> {
        check_range(start, end, self.len())?;
        Ok(self.sums[end] - self.sums[start])
    }

    /// Cost of `messages[range]`; zero for an empty range.
    pub(crate) fn span(&self, range: Range<usize>) -> u32 {
        if range.is_empty() {
            return 0;
        }
        self.sums[range.end] - self.sums[range.start]
    }

    /// Largest `end` in `zone.start..=zone.end` such that
    /// `messages[zone.start..end]` costs at most `budget`.
    pub fn longest_prefix_within(&self, zone: Range<usize>, budget: u32) -> usize {
        let base = self.sums[zone.start];
        let window = &self.sums[zone.start..=zone.end];
        // window[0] - base == 0 always fits, so the partition point is >= 1.
        let fitting = window.partition_point(|&sum| sum - base <= budget);
        zone.start + fitting - 1
    }

    /// Smallest `start` in `zone.start..=zone.end` such that
    /// `messages[start..zone.end]` costs at most `budget`.
    pub fn longest_suffix_within(&self, zone: Range<usize>, budget: u32) -> usize {
        let top = self.sums[zone.end];
        let window = &self.sums[zone.start..=zone.end];
        zone.start + window.partition_point(|&sum| top - sum > budget)
    }
}
