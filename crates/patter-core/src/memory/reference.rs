//! Referring-phrase resolution strategies.
//!
//! A fixed chain of pure functions, tried in order until one matches:
//! 1. list position ("the second one", "option 3")
//! 2. most recent entity of the kind the phrase implies ("my order", "it")
//! 3. the sole item of the last shown list, for bare references
//!
//! Strategies read metadata only; corrections are applied afterwards by the
//! manager so every strategy benefits from them.

use patter_types::metadata::{ConversationMetadata, EntityKind, TrackedEntity};

/// Which strategy produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    ListPosition,
    RecentEntity,
    SoleListItem,
}

/// A referring phrase resolved to a tracked entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub entity: TrackedEntity,
    pub strategy: ResolutionStrategy,
    /// True once the manager has rewritten the resolution through the
    /// correction log.
    pub corrected: bool,
}

type Strategy = fn(&str, &ConversationMetadata) -> Option<ResolvedReference>;

const CHAIN: &[Strategy] = &[list_position, recent_entity, sole_list_item];

/// Run the strategy chain. Deterministic and side-effect free.
pub fn resolve(phrase: &str, metadata: &ConversationMetadata) -> Option<ResolvedReference> {
    CHAIN.iter().find_map(|strategy| strategy(phrase, metadata))
}

fn list_position(phrase: &str, metadata: &ConversationMetadata) -> Option<ResolvedReference> {
    let list = metadata.last_list.as_ref()?;
    let position = parse_position(phrase)?;
    let entity = list.item_at(position)?;
    Some(ResolvedReference {
        entity: entity.clone(),
        strategy: ResolutionStrategy::ListPosition,
        corrected: false,
    })
}

fn recent_entity(phrase: &str, metadata: &ConversationMetadata) -> Option<ResolvedReference> {
    let kind = infer_kind(phrase)?;
    let entity = metadata.latest_entity(kind)?;
    Some(ResolvedReference {
        entity: entity.clone(),
        strategy: ResolutionStrategy::RecentEntity,
        corrected: false,
    })
}

fn sole_list_item(phrase: &str, metadata: &ConversationMetadata) -> Option<ResolvedReference> {
    if !is_referential(phrase) {
        return None;
    }
    let list = metadata.last_list.as_ref()?;
    if list.len() != 1 {
        return None;
    }
    Some(ResolvedReference {
        entity: list.items[0].clone(),
        strategy: ResolutionStrategy::SoleListItem,
        corrected: false,
    })
}

/// Extract a 1-indexed list position from a phrase, if it names one.
///
/// Understands word ordinals up to ten ("the second one"), digit ordinals
/// ("3rd"), and "number N" / "option N" / "item N".
pub fn parse_position(phrase: &str) -> Option<usize> {
    let lower = phrase.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    const ORDINALS: [(&str, usize); 10] = [
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
        ("sixth", 6),
        ("seventh", 7),
        ("eighth", 8),
        ("ninth", 9),
        ("tenth", 10),
    ];
    for token in &tokens {
        for (word, n) in ORDINALS {
            if *token == word {
                return Some(n);
            }
        }
    }

    for token in &tokens {
        for suffix in ["st", "nd", "rd", "th"] {
            if let Some(digits) = token.strip_suffix(suffix) {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    return digits.parse().ok();
                }
            }
        }
    }

    for pair in tokens.windows(2) {
        if matches!(pair[0], "number" | "option" | "item" | "no") {
            if pair[1].chars().all(|c| c.is_ascii_digit()) {
                return pair[1].parse().ok();
            }
        }
    }

    None
}

/// Infer which entity kind a phrase is about from its wording.
pub fn infer_kind(phrase: &str) -> Option<EntityKind> {
    let lower = phrase.to_lowercase();
    let has = |words: &[&str]| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|t| words.contains(&t))
    };

    if has(&["order", "orders", "delivery", "parcel", "shipment", "refund"]) {
        return Some(EntityKind::Order);
    }
    if has(&["category", "categories", "range", "collection"]) {
        return Some(EntityKind::Category);
    }
    if has(&["brand", "brands", "make", "manufacturer"]) {
        return Some(EntityKind::Brand);
    }
    if has(&["page", "article", "guide"]) {
        return Some(EntityKind::Page);
    }
    if has(&["it", "that", "this", "one", "product", "item", "them", "those"]) {
        return Some(EntityKind::Product);
    }
    None
}

/// Whether a phrase refers back to something at all, rather than naming a
/// new subject.
fn is_referential(phrase: &str) -> bool {
    let lower = phrase.to_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|t| matches!(t, "it" | "that" | "this" | "one" | "them" | "those"))
}
