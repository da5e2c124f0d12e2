use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::tool::{ToolCallRequest, ToolCallResult};

/// The author of a message in the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The system instructions.
    System,
    /// The human user.
    User,
    /// The model.
    Assistant,
    /// A tool answering a call request.
    Tool,
}

impl Display for ChatRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        };
        f.write_str(name)
    }
}

/// A complete message in the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    /// The system instructions.
    System {
        /// Instruction text.
        content: String,
    },
    /// A user input text.
    User {
        /// Input text.
        content: String,
    },
    /// A model turn, optionally requesting tool calls.
    Assistant(AssistantMessage),
    /// A tool call result.
    Tool(ToolCallResult),
}

impl ChatMessage {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a text-only assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls: vec![],
        })
    }

    /// Returns the role of this message.
    pub fn role(&self) -> ChatRole {
        match self {
            ChatMessage::System { .. } => ChatRole::System,
            ChatMessage::User { .. } => ChatRole::User,
            ChatMessage::Assistant(_) => ChatRole::Assistant,
            ChatMessage::Tool(_) => ChatRole::Tool,
        }
    }

    /// Returns the textual content of this message.
    ///
    /// Assistant turns that only request tools have empty content.
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System { content } | ChatMessage::User { content } => {
                content
            }
            ChatMessage::Assistant(msg) => &msg.content,
            ChatMessage::Tool(result) => &result.content,
        }
    }
}

/// A model turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Text generated by the model, possibly empty.
    pub content: String,
    /// Tool calls the model requested in this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_role_and_content() {
        let msg = ChatMessage::system("Only talk about debt.");
        assert_eq!(msg.role(), ChatRole::System);
        assert_eq!(msg.content(), "Only talk about debt.");

        let msg = ChatMessage::Assistant(AssistantMessage {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_owned(),
                name: "get_current_date".to_owned(),
                arguments: json!({}),
            }],
        });
        assert_eq!(msg.role(), ChatRole::Assistant);
        assert!(msg.content().is_empty());

        let msg = ChatMessage::Tool(ToolCallResult {
            id: "call_1".to_owned(),
            content: "2025-06-15".to_owned(),
        });
        assert_eq!(msg.role(), ChatRole::Tool);
        assert_eq!(msg.content(), "2025-06-15");
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(ChatMessage::user("Hi")).unwrap();
        assert_eq!(value, json!({ "role": "user", "content": "Hi" }));

        let value =
            serde_json::to_value(ChatMessage::assistant("Hello")).unwrap();
        assert_eq!(value, json!({ "role": "assistant", "content": "Hello" }));
    }
}
