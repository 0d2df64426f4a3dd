use super::{tailor_with, Cut, CutPolicy, TailoringStrategy};
use crate::budget::counter::{HeuristicTokenCounter, SharedTokenCounter};
use crate::budget::prefix_sum::PrefixSum;
use crate::budget::types::TailorError;
use crate::message::Message;
use std::ops::Range;
use std::sync::Arc;

/// Keeps both ends of the free zone and drops its interior.
///
/// The front of the free zone may use half of the remaining budget (rounded
/// up), the back takes whatever the front left, and the front then absorbs
/// any leftover. After this neither end can take another message.
#[derive(Clone)]
pub struct MiddleOut {
    counter: SharedTokenCounter,
}

impl MiddleOut {
    pub fn new(counter: SharedTokenCounter) -> Self {
        Self { counter }
    }
}

impl Default for MiddleOut {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicTokenCounter::default()))
    }
}

impl CutPolicy for MiddleOut {
    fn select(&self, prefix: &PrefixSum, zone: Range<usize>, remaining: u32) -> Cut {
        let front_end = prefix.longest_prefix_within(zone.clone(), remaining.div_ceil(2));
        let front_tokens = prefix.span(zone.start..front_end);

        let back_start =
            prefix.longest_suffix_within(front_end..zone.end, remaining - front_tokens);
        let back_tokens = prefix.span(back_start..zone.end);

        let front_end =
            prefix.longest_prefix_within(zone.start..back_start, remaining - back_tokens);

        Cut {
            front_end,
            back_start,
        }
    }
}

impl TailoringStrategy for MiddleOut {
    fn name(&self) -> &'static str {
        "middle_out"
    }

    fn tailor_messages(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<Vec<Message>, TailorError> {
        tailor_with(self.counter.as_ref(), self, self.name(), messages, max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::counter::TokenCounter;

    fn labelled(labels: &str, runes: usize) -> Vec<Message> {
        labels
            .chars()
            .map(|c| Message::assistant(c.to_string().repeat(runes), None))
            .collect()
    }

    fn firsts(messages: &[Message]) -> String {
        messages
            .iter()
            .filter_map(|m| m.content.chars().next())
            .collect()
    }

    #[test]
    fn keeps_both_ends_of_free_zone() {
        let mut messages = vec![Message::system("s".repeat(4))];
        messages.extend(labelled("abcdef", 40));
        messages.push(Message::user("z".repeat(4)));

        // preserved 2, free zone 6 x 10, remaining 40: two from each end
        let result = MiddleOut::default().tailor_messages(&messages, 42).unwrap();

        assert_eq!(firsts(&result), "sabefz");
    }

    #[test]
    fn back_uses_budget_the_front_could_not() {
        let mut messages = vec![Message::system("s".repeat(4))];
        // front message costs 30, the rest 5 each
        messages.push(Message::assistant("a".repeat(120), None));
        messages.extend(labelled("bcdefgh", 20));
        messages.push(Message::user("z".repeat(4)));

        // remaining 20: front half (10) cannot take 'a', back takes four
        let result = MiddleOut::default().tailor_messages(&messages, 22).unwrap();

        assert_eq!(firsts(&result), "sefghz");
    }

    #[test]
    fn front_absorbs_leftover_from_back() {
        let mut messages = vec![Message::system("s".repeat(4))];
        messages.extend(labelled("abcd", 20));
        // back message costs 30
        messages.push(Message::assistant("e".repeat(120), None));
        messages.push(Message::user("z".repeat(4)));

        // remaining 20: front takes two (10), back cannot take 'e', front grows to four
        let result = MiddleOut::default().tailor_messages(&messages, 22).unwrap();

        assert_eq!(firsts(&result), "sabcdz");
    }

    #[test]
    fn stays_within_budget_with_uneven_messages() {
        let mut messages = vec![Message::system("You are terse.")];
        for i in 1..40 {
            messages.push(Message::user("u".repeat(i * 3)));
            messages.push(Message::assistant("r".repeat(i * 7), None));
        }
        messages.push(Message::user("last"));

        let counter = HeuristicTokenCounter::default();
        for budget in [10, 25, 77, 150, 400] {
            let result = MiddleOut::default().tailor_messages(&messages, budget).unwrap();
            let total = counter.count_messages(&result);
            assert!(total <= budget, "budget {budget}: total {total}");
            assert_eq!(result.first().unwrap().content, "You are terse.");
            assert_eq!(result.last().unwrap().content, "last");
        }
    }
}
