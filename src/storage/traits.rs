//! Chat memory store trait.

use crate::Result;
use crate::models::{ChatMessage, ConversationId};

/// Persistence for the message history of chat conversations.
///
/// Each conversation is an ordered list of messages, replaced as a whole on
/// every update. Implementations must be safe to share between threads, but
/// they do not coordinate concurrent updates of the same conversation.
pub trait ChatMemoryStore: Send + Sync {
    /// Returns the messages of a conversation in insertion order.
    ///
    /// A conversation that was never written, or was deleted, yields an
    /// empty vector.
    fn get_messages(&self, id: &ConversationId) -> Result<Vec<ChatMessage>>;

    /// Replaces the messages of a conversation.
    ///
    /// An empty slice leaves the conversation absent.
    fn update_messages(&self, id: &ConversationId, messages: &[ChatMessage]) -> Result<()>;

    /// Deletes a conversation. Deleting a missing conversation is not an error.
    fn delete_messages(&self, id: &ConversationId) -> Result<()>;
}
