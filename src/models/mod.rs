//! Data models for chat memory.
//!
//! Conversation identifiers, typed chat messages and their JSON text encoding.

mod conversation;
mod message;

pub use conversation::ConversationId;
pub use message::{
    ChatMessage, ChatMessageType, Content, ToolExecutionRequest, message_from_json,
    message_to_json, messages_from_json, messages_to_json,
};
