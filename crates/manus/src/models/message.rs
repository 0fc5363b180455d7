use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::tool::ToolCallRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub text: String,
    pub created: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A reply from the model, optionally requesting tool calls
pub struct AssistantMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    pub created: i64,
}

impl AssistantMessage {
    /// Create a new assistant message with the current timestamp
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            created: Utc::now().timestamp(),
        }
    }

    /// Add a tool call request to the message
    pub fn with_tool_call<I, N, A>(mut self, id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        self.tool_calls
            .push(ToolCallRequest::new(id, name, arguments));
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// The answer to one tool call, paired through `for_call_id`
pub struct ToolResultMessage {
    pub for_call_id: String,
    pub tool_name: String,
    pub payload: String,
    pub created: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
/// A message in the conversation between the user, the model and the tools
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
    ToolResult(ToolResultMessage),
}

impl Message {
    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(text: S) -> Self {
        Message::User(UserMessage {
            text: text.into(),
            created: Utc::now().timestamp(),
        })
    }

    /// Create a new assistant message without tool calls
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Message::Assistant(AssistantMessage::new(text))
    }

    /// Create a tool result answering the call with the given id
    pub fn tool_result<I, N, P>(for_call_id: I, tool_name: N, payload: P) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        P: Into<String>,
    {
        Message::ToolResult(ToolResultMessage {
            for_call_id: for_call_id.into(),
            tool_name: tool_name.into(),
            payload: payload.into(),
            created: Utc::now().timestamp(),
        })
    }

    /// The text of the message; tool results expose their payload
    pub fn text(&self) -> &str {
        match self {
            Message::User(user) => &user.text,
            Message::Assistant(assistant) => &assistant.text,
            Message::ToolResult(result) => &result.payload,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::Assistant(assistant) => Some(assistant),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResultMessage> {
        match self {
            Message::ToolResult(result) => Some(result),
            _ => None,
        }
    }
}

impl From<AssistantMessage> for Message {
    fn from(message: AssistantMessage) -> Self {
        Message::Assistant(message)
    }
}
