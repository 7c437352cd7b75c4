//! # chat-memory-redis
//!
//! Persists conversational message history for AI chat memory into Redis.
//!
//! Each conversation is stored as one Redis list under
//! `<key_prefix><conversation_id>`, one JSON-encoded message per element, in
//! insertion order. An optional TTL is applied to the key on every write.
//!
//! ## Example
//!
//! ```rust,ignore
//! use chat_memory_redis::{ChatMemoryStore, ChatMessage, ConversationId, RedisChatMemoryStore};
//!
//! let store = RedisChatMemoryStore::builder()
//!     .host("localhost")
//!     .port(6379)
//!     .key_prefix("chat:memories:")
//!     .ttl(3600)
//!     .build()?;
//!
//! let id = ConversationId::from("session-42");
//! store.update_messages(&id, &[ChatMessage::user("hello"), ChatMessage::ai("hi!")])?;
//! assert_eq!(store.get_messages(&id)?.len(), 2);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod models;
pub mod observability;
pub mod storage;

pub use config::{AppConfig, DEFAULT_KEY_PREFIX, RedisStoreConfig};
pub use models::{
    ChatMessage, ChatMessageType, Content, ConversationId, ToolExecutionRequest, message_from_json,
    message_to_json, messages_from_json, messages_to_json,
};
pub use storage::{
    ChatMemoryStore, InMemoryChatMemoryStore, RedisChatMemoryStore, RedisChatMemoryStoreBuilder,
};

/// Error type for chat memory operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidConfig` | Blank host, missing port or key prefix, non-positive TTL, bad config file |
/// | `Unauthorized` | Redis rejects the command with `NOAUTH` / `WRONGPASS` |
/// | `Serialization` | A stored entry cannot be decoded into a message |
/// | `OperationFailed` | Any other Redis command, connection or I/O failure |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The store configuration is invalid.
    ///
    /// Raised synchronously while building a store, before any connection is
    /// opened.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Redis refused the command because of missing or wrong credentials.
    #[error("unauthorized during '{operation}': {cause}")]
    Unauthorized {
        /// The operation that was rejected.
        operation: String,
        /// The server or client message.
        cause: String,
    },

    /// A message could not be encoded or decoded.
    ///
    /// Aborts the whole `get_messages` call; partial results are never
    /// returned.
    #[error("serialization failed during '{operation}': {cause}")]
    Serialization {
        /// The operation that was running.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A remote command or local I/O operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Classifies a Redis client error raised while running `operation`.
    ///
    /// Authentication rejections become [`Error::Unauthorized`]; everything
    /// else is reported as [`Error::OperationFailed`].
    pub fn from_redis(operation: &str, err: &redis::RedisError) -> Self {
        let cause = err.to_string();
        if is_auth_failure(&cause) {
            Self::Unauthorized {
                operation: operation.to_string(),
                cause,
            }
        } else {
            Self::OperationFailed {
                operation: operation.to_string(),
                cause,
            }
        }
    }

    /// Returns `true` for [`Error::Unauthorized`].
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Matches the server replies and client messages Redis uses for auth failures.
fn is_auth_failure(message: &str) -> bool {
    const MARKERS: [&str; 5] = [
        "NOAUTH",
        "WRONGPASS",
        "Authentication required",
        "invalid password",
        "AuthenticationFailed",
    ];
    MARKERS.iter().any(|marker| message.contains(marker))
}

/// Result type alias for chat memory operations.
pub type Result<T> = std::result::Result<T, Error>;
