//! Conversation identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one chat session's message history.
///
/// The `Display` form is appended to the store's key prefix to build the
/// Redis key. Two distinct identifiers must not render to the same string;
/// if they do they share one history. This is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Creates a new conversation ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a random conversation ID (UUID v4).
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Uuid> for ConversationId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ConversationId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_input() {
        let id = ConversationId::new("user-42");
        assert_eq!(id.to_string(), "user-42");
        assert_eq!(id.as_str(), "user-42");
    }

    #[test]
    fn test_numeric_and_string_forms_collide() {
        // Documented caller contract: same string form, same conversation.
        assert_eq!(ConversationId::from(7_u64), ConversationId::from("7"));
    }

    #[test]
    fn test_uuid_conversion_uses_hyphenated_form() {
        let uuid = Uuid::nil();
        let id = ConversationId::from(uuid);
        assert_eq!(id.as_str(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(ConversationId::random(), ConversationId::random());
    }
}
