pub mod tool;
pub mod types;

pub use tool::{FunctionCall, ToolCall};
pub use types::{ContentPart, Message, Role};
