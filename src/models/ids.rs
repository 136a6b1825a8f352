//! Entity identifiers for league documents.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Identifier of a league document or embedded entity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from an existing string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate a deterministic EntityId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let hash = hex::encode(hasher.finalize());
        Self(hash[..16].to_string())
    }

    /// Generate a fresh random EntityId for entities with no natural key
    /// (goals, matches, roster members).
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string()[..16].to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

pub type SeasonId = EntityId;
pub type RoundId = EntityId;
pub type MatchId = EntityId;
pub type GoalId = EntityId;
pub type TeamId = EntityId;
pub type MemberId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation_deterministic() {
        let id1 = EntityId::generate(&["season", "Premier 2025/26", "2025-08-15"]);
        let id2 = EntityId::generate(&["season", "Premier 2025/26", "2025-08-15"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_entity_id_different_inputs() {
        let id1 = EntityId::generate(&["season", "Premier 2025/26", "2025-08-15"]);
        let id2 = EntityId::generate(&["season", "Premier 2026/27", "2026-08-14"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_length() {
        let id = EntityId::generate(&["team", "Rovers"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_ids_are_unique() {
        let a = EntityId::random();
        let b = EntityId::random();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from("abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");

        let parsed: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_entity_id_display_and_debug() {
        let id = EntityId::new("match-7".to_string());
        assert_eq!(format!("{}", id), "match-7");
        assert!(format!("{:?}", id).contains("match-7"));
    }
}
