use crate::message::tool::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One part of a multi-part message payload.
///
/// Only `Text` parts carry tokens; binary parts are references and count as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { url: String },
    Audio { url: String },
    File { name: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text payload, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "generate_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            role,
            content: content.into(),
            reasoning_content: None,
            content_parts: Vec::new(),
            tool_calls: None,
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    /// Attach reasoning output (e.g. from a thinking model).
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning_content = Some(reasoning.into());
        self
    }

    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.content_parts.push(part);
        self
    }

    pub fn is_tool(&self) -> bool {
        self.role == Role::Tool
    }

    /// Every text-bearing field in payload order: content, reasoning, text parts.
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.content.as_str())
            .chain(self.reasoning_content.as_deref())
            .chain(self.content_parts.iter().filter_map(ContentPart::as_text))
    }
}

/// Two messages are the same message when their ids match and their payloads agree.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.role == other.role
            && self.content == other.content
            && self.reasoning_content == other.reasoning_content
            && self.content_parts == other.content_parts
            && self.tool_calls == other.tool_calls
            && self.tool_call_id == other.tool_call_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_role_and_id() {
        let msg = Message::user("Hello");
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.role, Role::User);
        assert!(!msg.id.is_empty());
        assert_ne!(msg.id, Message::user("Hello").id);
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("call-1", "Sunny, 25°C");
        assert!(msg.is_tool());
        assert_eq!(msg.tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn text_fields_skip_binary_parts() {
        let msg = Message::assistant("main", None)
            .with_reasoning("thinking")
            .with_part(ContentPart::Audio {
                url: "file:///clip.wav".into(),
            })
            .with_part(ContentPart::text("caption"));
        let fields: Vec<&str> = msg.text_fields().collect();
        assert_eq!(fields, vec!["main", "thinking", "caption"]);
    }

    #[test]
    fn serializes_openai_style() {
        let msg = Message::assistant(
            "",
            Some(vec![ToolCall::function("call_1", "ask_user", r#"{"q":"?"}"#)]),
        );
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert!(json.get("reasoning_content").is_none());
        assert!(json.get("content_parts").is_none());
    }

    #[test]
    fn deserializes_minimal_message() {
        let msg: Message = serde_json::from_str(
            r#"{"role": "user", "content_parts": [{"type": "text", "text": "hi"}, {"type": "image", "url": "x.png"}]}"#,
        )
        .unwrap();
        assert_eq!(msg.role, Role::User);
        assert!(msg.content.is_empty());
        assert!(!msg.id.is_empty());
        assert_eq!(msg.content_parts.len(), 2);
        assert_eq!(msg.content_parts[0].as_text(), Some("hi"));
    }
}
