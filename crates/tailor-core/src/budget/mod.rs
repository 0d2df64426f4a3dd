//! Token budget management for LLM conversations.
//!
//! Fits a conversation into a model's context window without dropping the
//! system instructions or the turn being answered, and without leaving a tool
//! result at the front of the window.
//!
//! # Key Components
//!
//! - [`counter`]: Token counting via rune-based estimation
//! - [`segments`]: Preserved head/tail computation and result assembly
//! - [`prefix_sum`]: Cumulative token counts and binary-search cut points
//! - [`strategy`]: `HeadOut`, `TailOut` and `MiddleOut` tailoring strategies
//! - [`limits`]: Model context window registry
//! - [`types`]: `TokenBudget`, `PreservedSegments`, errors
//! - [`config`]: Strategy and registry configuration
//! - [`preparation`]: One-call context preparation with usage reporting

pub mod config;
pub mod counter;
pub mod limits;
pub mod prefix_sum;
pub mod preparation;
pub mod segments;
pub mod strategy;
pub mod types;

pub use config::{default_config_path, ConfigError, TailorConfig};
pub use counter::{HeuristicTokenCounter, SharedTokenCounter, TokenCounter};
pub use limits::{ContextWindowRegistry, KNOWN_CONTEXT_WINDOWS};
pub use prefix_sum::PrefixSum;
pub use preparation::prepare_context;
pub use segments::{
    build_preserved_only_result, preserved_head_count, preserved_tail_count,
    strip_leading_tool_messages,
};
pub use strategy::{HeadOut, MiddleOut, StrategyKind, TailOut, TailoringStrategy};
pub use types::{
    CounterError, PreparedContext, PreservedSegments, TailorError, TokenBudget,
    TokenUsageBreakdown,
};
