//! The conversation owned by a single agent run.
//!
//! Appends are the normal mutation; [`ConversationContext::replace`] is reserved for the
//! tool executor, which hands back a rebuilt history holding the assistant tool-call
//! message together with every tool result it produced.
use serde::{Deserialize, Serialize};

use crate::models::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext {
    messages: Vec<Message>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Substitute the whole history
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// An owned copy of the history, in order
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Ids of tool calls that were not answered before the next assistant message
    /// (or before the end of the history).
    pub fn unanswered_tool_calls(&self) -> Vec<String> {
        let mut unanswered = Vec::new();
        let mut open: Vec<String> = Vec::new();

        for message in &self.messages {
            match message {
                Message::Assistant(assistant) => {
                    unanswered.append(&mut open);
                    open = assistant.tool_calls.iter().map(|c| c.id.clone()).collect();
                }
                Message::ToolResult(result) => {
                    open.retain(|id| id != &result.for_call_id);
                }
                Message::User(_) => {}
            }
        }
        unanswered.append(&mut open);
        unanswered
    }

    /// True when every tool call in the history has its result
    pub fn is_consistent(&self) -> bool {
        self.unanswered_tool_calls().is_empty()
    }
}

impl From<Vec<Message>> for ConversationContext {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a ConversationContext {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
