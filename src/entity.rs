//! Reference entities and their identifiers.
//!
//! An entity is the thing a free-text name should resolve to: a row of the
//! reference dataset with a caller-supplied identifier and its raw display
//! name. Identifiers are opaque; the resolver never interprets them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-supplied, opaque entity identifier.
///
/// Identifiers are assumed stable and unique per entity. Ordering is the
/// plain string ordering, which keeps candidate sets and audit output
/// deterministic.
///
/// # Examples
///
/// ```
/// use namelink::EntityId;
///
/// let id = EntityId::new("nm0000134");
/// assert_eq!(id.as_str(), "nm0000134");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A row of the reference dataset.
///
/// `canonical_name` is kept raw and unnormalized; normalization is derived
/// on demand when the index is built.
///
/// # Examples
///
/// ```
/// use namelink::Entity;
///
/// let entity = Entity::new("1", "Smith, John");
/// assert_eq!(entity.canonical_name, "Smith, John");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier the name resolves to.
    pub id: EntityId,

    /// Raw display name as it appears in the reference data.
    #[serde(alias = "name")]
    pub canonical_name: String,
}

impl Entity {
    /// Creates a new entity from an id and a raw name.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            canonical_name: name.into(),
        }
    }

    /// Returns true if this row carries both an id and a name.
    ///
    /// Rows failing this check are dropped during index construction.
    #[must_use]
    pub fn is_indexable(&self) -> bool {
        !self.id.is_blank() && !self.canonical_name.trim().is_empty()
    }
}

impl<I: Into<EntityId>, N: Into<String>> From<(I, N)> for Entity {
    fn from((id, name): (I, N)) -> Self {
        Self::new(id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("42");
        assert_eq!(format!("{id}"), "42");
    }

    #[test]
    fn test_entity_id_ordering_is_lexicographic() {
        let mut ids = vec![EntityId::from("b"), EntityId::from("a"), EntityId::from("10")];
        ids.sort();
        assert_eq!(ids, vec![EntityId::from("10"), EntityId::from("a"), EntityId::from("b")]);
    }

    #[test]
    fn test_entity_id_from_number() {
        assert_eq!(EntityId::from(7u64).as_str(), "7");
    }

    #[test]
    fn test_entity_from_tuple() {
        let entity: Entity = ("1", "John Smith").into();
        assert_eq!(entity.id, EntityId::from("1"));
        assert_eq!(entity.canonical_name, "John Smith");
    }

    #[test]
    fn test_entity_is_indexable() {
        assert!(Entity::new("1", "John").is_indexable());
        assert!(!Entity::new("", "John").is_indexable());
        assert!(!Entity::new("  ", "John").is_indexable());
        assert!(!Entity::new("1", "   ").is_indexable());
    }

    #[test]
    fn test_entity_serialization_accepts_name_alias() {
        let entity: Entity = serde_json::from_str(r#"{"id":"9","name":"Anne Lee"}"#).unwrap();
        assert_eq!(entity.canonical_name, "Anne Lee");

        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains(r#""id":"9""#));
        assert!(json.contains("canonical_name"));
    }
}
