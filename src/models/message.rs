//! Chat messages and their text encoding.
//!
//! Messages are stored as JSON objects tagged by `"type"`:
//!
//! | Variant | `type` | Fields |
//! |---------|--------|--------|
//! | System | `SYSTEM` | `text` |
//! | User | `USER` | `name`?, `contents` |
//! | Ai | `AI` | `text`?, `toolExecutionRequests`? |
//! | Tool result | `TOOL_EXECUTION_RESULT` | `id`, `toolName`, `text` |
//!
//! Absent options and empty lists are omitted from the encoding.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A piece of user-supplied content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all_fields = "camelCase")]
pub enum Content {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image referenced by URL (or a `data:` URL).
    Image {
        /// Image location.
        url: String,
        /// MIME type, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl Content {
    /// Creates a text content part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image content part.
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image {
            url: url.into(),
            mime_type: None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolExecutionRequest {
    /// Request identifier, echoed back in the tool result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool name.
    pub name: String,
    /// Arguments as a JSON string.
    pub arguments: String,
}

/// A unit of chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all_fields = "camelCase")]
pub enum ChatMessage {
    /// Instructions for the model.
    System {
        /// The instructions.
        text: String,
    },
    /// A message from the user.
    User {
        /// Optional participant name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Content parts in order.
        contents: Vec<Content>,
    },
    /// A reply from the model.
    Ai {
        /// Reply text; absent when the model only requested tools.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Tools the model asked to run.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_execution_requests: Vec<ToolExecutionRequest>,
    },
    /// The output of a tool run.
    ToolExecutionResult {
        /// Identifier of the originating request.
        id: String,
        /// Name of the tool that ran.
        tool_name: String,
        /// Tool output.
        text: String,
    },
}

/// Discriminant of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatMessageType {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Model reply.
    Ai,
    /// Tool output.
    ToolExecutionResult,
}

impl ChatMessageType {
    /// Returns the encoded `type` tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::User => "USER",
            Self::Ai => "AI",
            Self::ToolExecutionResult => "TOOL_EXECUTION_RESULT",
        }
    }
}

impl fmt::Display for ChatMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    /// Creates a user message with a single text part.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            name: None,
            contents: vec![Content::text(text)],
        }
    }

    /// Creates a named user message with a single text part.
    #[must_use]
    pub fn user_named(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::User {
            name: Some(name.into()),
            contents: vec![Content::text(text)],
        }
    }

    /// Creates a model reply.
    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self::Ai {
            text: Some(text.into()),
            tool_execution_requests: Vec::new(),
        }
    }

    /// Creates a model reply that only requests tool runs.
    #[must_use]
    pub const fn ai_tool_requests(requests: Vec<ToolExecutionRequest>) -> Self {
        Self::Ai {
            text: None,
            tool_execution_requests: requests,
        }
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn tool_result(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::ToolExecutionResult {
            id: id.into(),
            tool_name: tool_name.into(),
            text: text.into(),
        }
    }

    /// Returns the message kind.
    #[must_use]
    pub const fn message_type(&self) -> ChatMessageType {
        match self {
            Self::System { .. } => ChatMessageType::System,
            Self::User { .. } => ChatMessageType::User,
            Self::Ai { .. } => ChatMessageType::Ai,
            Self::ToolExecutionResult { .. } => ChatMessageType::ToolExecutionResult,
        }
    }

    /// Returns the primary text of the message.
    ///
    /// For user messages this is the first text part.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { text } | Self::ToolExecutionResult { text, .. } => Some(text),
            Self::Ai { text, .. } => text.as_deref(),
            Self::User { contents, .. } => contents.iter().find_map(|c| match c {
                Content::Text { text } => Some(text.as_str()),
                Content::Image { .. } => None,
            }),
        }
    }
}

/// Encodes one message as a JSON string.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails.
pub fn message_to_json(message: &ChatMessage) -> Result<String> {
    serde_json::to_string(message).map_err(|e| Error::Serialization {
        operation: "encode_message".to_string(),
        cause: e.to_string(),
    })
}

/// Decodes one message from a JSON string.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the text is not a valid message.
pub fn message_from_json(json: &str) -> Result<ChatMessage> {
    serde_json::from_str(json).map_err(|e| Error::Serialization {
        operation: "decode_message".to_string(),
        cause: e.to_string(),
    })
}

/// Encodes a sequence of messages as a JSON array.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails.
pub fn messages_to_json(messages: &[ChatMessage]) -> Result<String> {
    serde_json::to_string_pretty(messages).map_err(|e| Error::Serialization {
        operation: "encode_messages".to_string(),
        cause: e.to_string(),
    })
}

/// Decodes a JSON array of messages.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the text is not an array of messages.
pub fn messages_from_json(json: &str) -> Result<Vec<ChatMessage>> {
    serde_json::from_str(json).map_err(|e| Error::Serialization {
        operation: "decode_messages".to_string(),
        cause: e.to_string(),
    })
}
