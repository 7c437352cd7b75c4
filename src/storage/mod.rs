//! Chat memory storage.
//!
//! - [`RedisChatMemoryStore`]: one Redis list per conversation, optional TTL.
//! - [`InMemoryChatMemoryStore`]: process-local store for tests and
//!   development, same key scheme and encoding.

// Allow significant_drop_tightening - returning pooled connections slightly
// later provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

mod connection;
mod memory;
mod redis_store;
mod traits;

pub use connection::ConnectionPool;
pub use memory::InMemoryChatMemoryStore;
pub use redis_store::{RedisChatMemoryStore, RedisChatMemoryStoreBuilder};
pub use traits::ChatMemoryStore;

use crate::models::ConversationId;

/// Builds the storage key for a conversation: `<prefix><id>`.
pub(crate) fn conversation_key(prefix: &str, id: &ConversationId) -> String {
    format!("{prefix}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_key() {
        let id = ConversationId::from("foo");
        assert_eq!(conversation_key("message_store:", &id), "message_store:foo");
        assert_eq!(conversation_key("", &id), "foo");
    }
}
