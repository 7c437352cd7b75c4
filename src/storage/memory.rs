//! In-memory chat memory store for testing.
//!
//! Keeps the same key scheme and JSON encoding as the Redis store so that
//! both behave identically apart from expiration, which is not supported.

use super::conversation_key;
use super::traits::ChatMemoryStore;
use crate::config::DEFAULT_KEY_PREFIX;
use crate::models::{ChatMessage, ConversationId, message_from_json, message_to_json};
use crate::Result;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Lists = HashMap<String, Vec<String>>;

/// In-memory chat memory store.
///
/// Uses `RwLock` for thread-safe access. Data is not persisted between runs.
#[derive(Debug)]
pub struct InMemoryChatMemoryStore {
    key_prefix: String,
    lists: RwLock<Lists>,
}

impl Default for InMemoryChatMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChatMemoryStore {
    /// Creates an empty store with the default key prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_prefix(DEFAULT_KEY_PREFIX)
    }

    /// Creates an empty store with a custom key prefix.
    #[must_use]
    pub fn with_key_prefix(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            lists: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the key prefix.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Returns the number of stored conversations.
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.read_lists().len()
    }

    /// Stores raw encoded entries for a conversation, bypassing encoding.
    pub fn insert_raw(&self, id: &ConversationId, entries: Vec<String>) {
        let key = conversation_key(&self.key_prefix, id);
        let mut lists = self.write_lists();
        if entries.is_empty() {
            lists.remove(&key);
        } else {
            lists.insert(key, entries);
        }
    }

    /// Returns the raw encoded entries of a conversation.
    #[must_use]
    pub fn raw_entries(&self, id: &ConversationId) -> Vec<String> {
        let key = conversation_key(&self.key_prefix, id);
        self.read_lists().get(&key).cloned().unwrap_or_default()
    }

    // A poisoned lock still holds a consistent map: writers only swap whole lists.
    fn read_lists(&self) -> RwLockReadGuard<'_, Lists> {
        self.lists.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lists(&self) -> RwLockWriteGuard<'_, Lists> {
        self.lists.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatMemoryStore for InMemoryChatMemoryStore {
    fn get_messages(&self, id: &ConversationId) -> Result<Vec<ChatMessage>> {
        self.raw_entries(id)
            .iter()
            .map(|entry| message_from_json(entry))
            .collect()
    }

    fn update_messages(&self, id: &ConversationId, messages: &[ChatMessage]) -> Result<()> {
        let entries = messages
            .iter()
            .map(message_to_json)
            .collect::<Result<Vec<_>>>()?;
        self.insert_raw(id, entries);
        Ok(())
    }

    fn delete_messages(&self, id: &ConversationId) -> Result<()> {
        let key = conversation_key(&self.key_prefix, id);
        self.write_lists().remove(&key);
        Ok(())
    }
}
