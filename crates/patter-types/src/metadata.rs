//! Conversation metadata types for Patter.
//!
//! `ConversationMetadata` is the short-term referential memory attached to a
//! conversation: which entities were mentioned, the last numbered list shown
//! to the user, and the log of user corrections. It evolves monotonically
//! (corrections append, they never erase history) and must round-trip through
//! serialization with no loss of list positions or entity kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of entity tracked for reference resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,
    Order,
    Category,
    Brand,
    Page,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Product => write!(f, "product"),
            EntityKind::Order => write!(f, "order"),
            EntityKind::Category => write!(f, "category"),
            EntityKind::Brand => write!(f, "brand"),
            EntityKind::Page => write!(f, "page"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" => Ok(EntityKind::Product),
            "order" => Ok(EntityKind::Order),
            "category" => Ok(EntityKind::Category),
            "brand" => Ok(EntityKind::Brand),
            "page" => Ok(EntityKind::Page),
            other => Err(format!("invalid entity kind: '{other}'")),
        }
    }
}

/// A single entity mention remembered for later reference resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// Display label as shown to the user (e.g. product name).
    pub label: String,
    /// Stable identifier (product id, order ref, URL slug).
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub mentioned_at: DateTime<Utc>,
}

impl TrackedEntity {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            url: None,
            mentioned_at: Utc::now(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// The last numbered list shown to the user. Positions are 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedList {
    pub items: Vec<TrackedEntity>,
    pub shown_at: DateTime<Utc>,
}

impl TrackedList {
    pub fn new(items: Vec<TrackedEntity>) -> Self {
        Self {
            items,
            shown_at: Utc::now(),
        }
    }

    /// Item at 1-indexed position `n`, or None if out of range.
    pub fn item_at(&self, n: usize) -> Option<&TrackedEntity> {
        n.checked_sub(1).and_then(|i| self.items.get(i))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One user correction: "not X, I meant Y".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub from: String,
    pub to: String,
    /// What was corrected ("product", "quantity", "spelling", ...).
    pub field: String,
    pub at: DateTime<Utc>,
}

/// Short-term referential memory for one conversation.
///
/// Owned exclusively by its `Conversation`. The entity map is a `BTreeMap`
/// so serialization order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    #[serde(default)]
    pub entities: BTreeMap<EntityKind, Vec<TrackedEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_list: Option<TrackedList>,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub summary: String,
}

impl ConversationMetadata {
    /// Most recent mention of the given kind, if any.
    pub fn latest_entity(&self, kind: EntityKind) -> Option<&TrackedEntity> {
        self.entities
            .get(&kind)
            .and_then(|mentions| mentions.last())
    }

    /// Total entity mentions across all kinds.
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> ConversationMetadata {
        let mut metadata = ConversationMetadata::default();
        metadata.entities.insert(
            EntityKind::Product,
            vec![
                TrackedEntity::new("Blue Mug", "prod_101").with_url("/products/blue-mug"),
                TrackedEntity::new("Red Mug", "prod_102"),
            ],
        );
        metadata.entities.insert(
            EntityKind::Order,
            vec![TrackedEntity::new("Order #5512", "5512")],
        );
        metadata.last_list = Some(TrackedList::new(vec![
            TrackedEntity::new("Blue Mug", "prod_101"),
            TrackedEntity::new("Red Mug", "prod_102"),
            TrackedEntity::new("Green Mug", "prod_103"),
        ]));
        metadata.corrections.push(Correction {
            from: "Blue Mug".to_string(),
            to: "Navy Mug".to_string(),
            field: "product".to_string(),
            at: Utc::now(),
        });
        metadata.summary = "Customer is shopping for mugs.".to_string();
        metadata
    }

    #[test]
    fn test_entity_kind_roundtrip() {
        for kind in [
            EntityKind::Product,
            EntityKind::Order,
            EntityKind::Category,
            EntityKind::Brand,
            EntityKind::Page,
        ] {
            let s = kind.to_string();
            let parsed: EntityKind = s.parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_entity_kind_as_map_key_serde() {
        let mut entities: BTreeMap<EntityKind, Vec<TrackedEntity>> = BTreeMap::new();
        entities.insert(EntityKind::Product, vec![TrackedEntity::new("A", "1")]);
        let json = serde_json::to_string(&entities).unwrap();
        assert!(json.contains("\"product\""));
        let parsed: BTreeMap<EntityKind, Vec<TrackedEntity>> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_list_positions_are_one_indexed() {
        let list = TrackedList::new(vec![
            TrackedEntity::new("first", "1"),
            TrackedEntity::new("second", "2"),
        ]);
        assert_eq!(list.item_at(1).map(|e| e.label.as_str()), Some("first"));
        assert_eq!(list.item_at(2).map(|e| e.label.as_str()), Some("second"));
        assert!(list.item_at(0).is_none());
        assert!(list.item_at(3).is_none());
    }

    #[test]
    fn test_metadata_serde_roundtrip_is_lossless() {
        let metadata = sample_metadata();
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: ConversationMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_roundtrip_preserves_list_positions() {
        let metadata = sample_metadata();
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: ConversationMetadata = serde_json::from_str(&json).unwrap();
        let list = parsed.last_list.expect("list survives roundtrip");
        assert_eq!(list.item_at(2).map(|e| e.value.as_str()), Some("prod_102"));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_latest_entity_is_most_recent_mention() {
        let metadata = sample_metadata();
        let latest = metadata.latest_entity(EntityKind::Product).unwrap();
        assert_eq!(latest.label, "Red Mug");
        assert!(metadata.latest_entity(EntityKind::Brand).is_none());
    }

    #[test]
    fn test_empty_metadata_deserializes_from_empty_object() {
        let parsed: ConversationMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ConversationMetadata::default());
        assert_eq!(parsed.entity_count(), 0);
    }
}
