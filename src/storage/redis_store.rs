//! Redis-backed chat memory store.
//!
//! Each conversation lives in one Redis list, `<key_prefix><conversation_id>`,
//! holding one JSON-encoded message per element in insertion order.
//!
//! | Operation | Commands |
//! |-----------|----------|
//! | `get_messages` | `LRANGE key 0 -1` |
//! | `update_messages` | `DEL key`, `RPUSH key msg` per message, `EXPIRE key ttl` |
//! | `delete_messages` | `DEL key` |
//!
//! # Consistency
//!
//! `update_messages` is not atomic. Its commands are sent one after another,
//! so a failure part way through can leave the conversation deleted,
//! partially written, or without its TTL. Concurrent updates of the same
//! conversation may interleave and merge. Callers that need stronger
//! guarantees must serialize updates per conversation themselves.

use super::conversation_key;
use super::connection::ConnectionPool;
use super::traits::ChatMemoryStore;
use crate::config::{RedisSettings, RedisStoreConfig};
use crate::models::{ChatMessage, ConversationId, message_from_json, message_to_json};
use crate::observability::record_operation;
use crate::{Error, Result};
use redis::Commands;
use std::time::Instant;
use tracing::instrument;

/// Chat memory store backed by Redis lists.
///
/// Owns its connection pool; the pool is never shared with other stores.
pub struct RedisChatMemoryStore {
    config: RedisStoreConfig,
    pool: ConnectionPool,
}

impl RedisChatMemoryStore {
    /// Returns a builder with the default key prefix and no TTL.
    #[must_use]
    pub fn builder() -> RedisChatMemoryStoreBuilder {
        RedisChatMemoryStoreBuilder::default()
    }

    /// Creates a store from a validated configuration and connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns an error if the first connection cannot be established.
    pub fn new(config: RedisStoreConfig) -> Result<Self> {
        let pool = ConnectionPool::open(&config)?;
        Ok(Self { config, pool })
    }

    /// Validates raw settings, then creates a store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] before any network call if the
    /// settings are invalid, or a connection error from [`Self::new`].
    pub fn from_settings(settings: RedisSettings) -> Result<Self> {
        Self::new(RedisStoreConfig::try_from(settings)?)
    }

    /// Returns the store configuration.
    pub const fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    /// Returns the key TTL in seconds, if any.
    pub const fn ttl(&self) -> Option<u64> {
        self.config.ttl
    }

    /// Returns the key prefix.
    pub fn key_prefix(&self) -> &str {
        &self.config.key_prefix
    }

    /// Returns the Redis key used for a conversation.
    pub fn key_for(&self, id: &ConversationId) -> String {
        conversation_key(&self.config.key_prefix, id)
    }

    /// Returns the connection pool.
    pub const fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn read(&self, key: &str) -> Result<Vec<ChatMessage>> {
        let mut conn = self.pool.checkout()?;
        let entries: Vec<String> = conn
            .lrange(key, 0, -1)
            .map_err(|e| Error::from_redis("redis_lrange", &e))?;
        self.pool.checkin(conn);

        entries.iter().map(|entry| message_from_json(entry)).collect()
    }

    fn replace(&self, key: &str, entries: &[String]) -> Result<()> {
        let mut conn = self.pool.checkout()?;

        let _: () = conn
            .del(key)
            .map_err(|e| Error::from_redis("redis_del", &e))?;

        for entry in entries {
            let _: () = conn
                .rpush(key, entry)
                .map_err(|e| Error::from_redis("redis_rpush", &e))?;
        }

        if let Some(ttl) = self.config.ttl {
            let seconds = i64::try_from(ttl).unwrap_or(i64::MAX);
            let _: () = conn
                .expire(key, seconds)
                .map_err(|e| Error::from_redis("redis_expire", &e))?;
        }

        self.pool.checkin(conn);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.checkout()?;
        let _: () = conn
            .del(key)
            .map_err(|e| Error::from_redis("redis_del", &e))?;
        self.pool.checkin(conn);
        Ok(())
    }
}

impl ChatMemoryStore for RedisChatMemoryStore {
    #[instrument(skip(self, id), fields(conversation_id = %id))]
    fn get_messages(&self, id: &ConversationId) -> Result<Vec<ChatMessage>> {
        let started = Instant::now();
        let key = self.key_for(id);

        let result = self.read(&key);
        record_operation("get_messages", started, &result);

        if let Ok(messages) = &result {
            tracing::debug!(key = %key, count = messages.len(), "Loaded chat messages");
        }
        result
    }

    #[instrument(skip(self, id, messages), fields(conversation_id = %id, count = messages.len()))]
    fn update_messages(&self, id: &ConversationId, messages: &[ChatMessage]) -> Result<()> {
        let started = Instant::now();
        let key = self.key_for(id);

        let result = messages
            .iter()
            .map(message_to_json)
            .collect::<Result<Vec<_>>>()
            .and_then(|entries| self.replace(&key, &entries));
        record_operation("update_messages", started, &result);

        if result.is_ok() {
            tracing::debug!(key = %key, ttl = ?self.config.ttl, "Replaced chat messages");
        }
        result
    }

    #[instrument(skip(self, id), fields(conversation_id = %id))]
    fn delete_messages(&self, id: &ConversationId) -> Result<()> {
        let started = Instant::now();
        let key = self.key_for(id);

        let result = self.remove(&key);
        record_operation("delete_messages", started, &result);

        if result.is_ok() {
            tracing::debug!(key = %key, "Deleted chat messages");
        }
        result
    }
}

/// Builder for [`RedisChatMemoryStore`].
///
/// `host` and `port` are required. The key prefix defaults to
/// [`crate::DEFAULT_KEY_PREFIX`]; keys never expire unless `ttl` is set.
#[derive(Debug, Default)]
pub struct RedisChatMemoryStoreBuilder {
    settings: RedisSettings,
}

impl RedisChatMemoryStoreBuilder {
    /// Redis server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.settings.host = Some(host.into());
        self
    }

    /// Redis server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = Some(port);
        self
    }

    /// ACL username, only used together with a password.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.settings.user = Some(user.into());
        self
    }

    /// Password; switches the connection to authenticated mode.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.settings.password = Some(password.into());
        self
    }

    /// Prefix prepended to every conversation key.
    #[must_use]
    pub fn key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.settings.key_prefix = Some(key_prefix.into());
        self
    }

    /// Key expiration in seconds, applied on every update. Must be positive.
    #[must_use]
    pub fn ttl(mut self, ttl: i64) -> Self {
        self.settings.ttl = Some(ttl);
        self
    }

    /// Read/write timeout for each pooled connection, in seconds.
    #[must_use]
    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.command_timeout_secs = Some(secs);
        self
    }

    /// Maximum idle connections kept for reuse.
    #[must_use]
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.settings.max_idle = Some(max_idle);
        self
    }

    /// Validates the settings without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a required field is missing or
    /// the TTL is not positive.
    pub fn build_config(self) -> Result<RedisStoreConfig> {
        RedisStoreConfig::try_from(self.settings)
    }

    /// Validates the settings and connects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] before any network call if the
    /// settings are invalid, or a connection error otherwise.
    pub fn build(self) -> Result<RedisChatMemoryStore> {
        RedisChatMemoryStore::new(self.build_config()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_builder_config_reports_ttl_and_prefix() {
        let config = RedisChatMemoryStore::builder()
            .host("localhost")
            .port(6379)
            .password("redis-stack")
            .key_prefix("chat:memories:")
            .ttl(1000)
            .build_config()
            .unwrap();

        assert_eq!(config.ttl, Some(1000));
        assert_eq!(config.key_prefix, "chat:memories:");
        assert!(config.password.is_some());
    }

    #[test]
    fn test_builder_defaults() {
        let config = RedisChatMemoryStore::builder()
            .host("localhost")
            .port(6379)
            .build_config()
            .unwrap();

        assert_eq!(config.key_prefix, crate::DEFAULT_KEY_PREFIX);
        assert_eq!(config.ttl, None);
        assert!(config.user.is_none());
    }

    // Port 1 on localhost is never a Redis server: validation must fail first,
    // otherwise these would surface as connection errors.
    #[test_case(RedisChatMemoryStore::builder().port(1) ; "no host")]
    #[test_case(RedisChatMemoryStore::builder().host(" ").port(1) ; "blank host")]
    #[test_case(RedisChatMemoryStore::builder().host("127.0.0.1") ; "no port")]
    #[test_case(RedisChatMemoryStore::builder().host("127.0.0.1").port(1).ttl(0) ; "zero ttl")]
    #[test_case(RedisChatMemoryStore::builder().host("127.0.0.1").port(1).ttl(-1) ; "negative ttl")]
    fn test_build_rejects_invalid_config_before_connecting(builder: RedisChatMemoryStoreBuilder) {
        assert!(matches!(builder.build(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_build_rejects_null_key_prefix() {
        let mut builder = RedisChatMemoryStore::builder().host("127.0.0.1").port(1);
        builder.settings.key_prefix = None;
        assert!(matches!(builder.build(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_build_reports_connection_failure() {
        let result = RedisChatMemoryStore::builder()
            .host("127.0.0.1")
            .port(1)
            .build();
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }
}
