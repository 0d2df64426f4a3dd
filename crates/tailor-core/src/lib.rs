pub mod budget;
pub mod message;

pub use budget::{
    prepare_context, ContextWindowRegistry, CounterError, HeadOut, HeuristicTokenCounter,
    MiddleOut, PreparedContext, SharedTokenCounter, StrategyKind, TailOut, TailorConfig,
    TailorError, TailoringStrategy, TokenBudget, TokenCounter,
};
pub use message::{ContentPart, FunctionCall, Message, Role, ToolCall};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
