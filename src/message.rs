//! Conversation message model.
//!
//! Mirrors the stored-session wire format: a transcript is an ordered list of
//! role-tagged messages, and assistant turns carry a list of content blocks.
//! This crate only pattern-matches on these shapes; the schema itself is owned
//! by the session store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single turn in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Message {
    /// A user turn. Content is opaque to the repair engine and passed through
    /// untouched.
    User { content: Value },
    /// An assistant turn: an ordered sequence of content blocks.
    Assistant { content: Vec<ContentBlock> },
    /// The outcome of a tool call, referencing the call by id.
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        content: Value,
        is_error: bool,
    },
}

impl Message {
    /// Returns the tool call id if this is a tool result message.
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::ToolResult { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    /// Returns true if this is a tool result message.
    pub fn is_tool_result(&self) -> bool {
        matches!(self, Message::ToolResult { .. })
    }
}

/// A block within an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    /// Plain assistant text.
    Text { text: String },
    /// A request to invoke a named tool. The id is expected to be unique
    /// across the transcript; a block that arrives without one carries the
    /// empty string and can never be matched to a real result.
    ToolCall {
        #[serde(default)]
        id: String,
        name: String,
        arguments: Value,
    },
}
