//! Conversation metadata operations.
//!
//! `MetadataManager` is a stateless namespace: every operation takes the
//! metadata explicitly, so callers control when mutations happen and tests
//! need no fixtures beyond a metadata value. Lists overwrite (never merge),
//! corrections append, and reference resolution rewrites its answer through
//! the correction log with the most recent correction winning.

use patter_types::conversation::{ToolCallRecord, ToolOutcome};
use patter_types::metadata::{ConversationMetadata, Correction, EntityKind, TrackedEntity, TrackedList};
use patter_types::search::{SearchReport, SearchResult, SearchSource};
use serde_json::Value;

use super::reference::{self, ResolvedReference};

const SUMMARY_MAX_CHARS: usize = 480;

/// Stateless operations over [`ConversationMetadata`].
pub struct MetadataManager;

impl MetadataManager {
    /// Replace the last shown list. Overwrites any previous list whole;
    /// partial merges would leave positions pointing at stale items.
    pub fn track_list(metadata: &mut ConversationMetadata, items: Vec<TrackedEntity>) {
        metadata.last_list = Some(TrackedList::new(items));
    }

    /// Item at 1-indexed position `n` of the last shown list.
    pub fn resolve_list_item(metadata: &ConversationMetadata, n: usize) -> Option<&TrackedEntity> {
        metadata.last_list.as_ref().and_then(|list| list.item_at(n))
    }

    /// Record an entity mention.
    pub fn track_entity(
        metadata: &mut ConversationMetadata,
        kind: EntityKind,
        entity: TrackedEntity,
    ) {
        metadata.entities.entry(kind).or_default().push(entity);
    }

    /// Append to the correction log.
    pub fn track_correction(
        metadata: &mut ConversationMetadata,
        from: impl Into<String>,
        to: impl Into<String>,
        field: impl Into<String>,
    ) {
        metadata.corrections.push(Correction {
            from: from.into(),
            to: to.into(),
            field: field.into(),
            at: chrono::Utc::now(),
        });
    }

    /// Resolve a referring phrase through the strategy chain, then rewrite
    /// the result through the correction log.
    pub fn resolve_reference(
        metadata: &ConversationMetadata,
        phrase: &str,
    ) -> Option<ResolvedReference> {
        let resolved = reference::resolve(phrase, metadata)?;
        Some(Self::apply_corrections(metadata, resolved))
    }

    /// Record that a resolved reference was acted on, so later pronouns
    /// land on it.
    pub fn note_reference(metadata: &mut ConversationMetadata, resolved: &ResolvedReference) {
        Self::track_entity(metadata, EntityKind::Product, resolved.entity.clone());
    }

    /// Detect an explicit correction in a user message.
    ///
    /// Understands "not X, I meant Y" and bare "I meant Y". Returns the
    /// corrected-from phrase when present.
    pub fn detect_correction(text: &str) -> Option<(Option<String>, String)> {
        let lower = text.to_lowercase();
        let marker = "i meant";
        let idx = lower.find(marker)?;
        let to = trim_phrase(text.get(idx + marker.len()..)?);
        if to.is_empty() {
            return None;
        }
        let from = lower.get(..idx)?.rfind("not ").and_then(|nidx| {
            let raw = text.get(nidx + 4..idx)?;
            let trimmed = trim_phrase(raw);
            (!trimmed.is_empty()).then_some(trimmed)
        });
        Some((from, to))
    }

    /// Fold one finished turn into the metadata: corrections from the user
    /// message, entities and lists from tool results, and the rolling
    /// summary.
    pub fn absorb_turn(
        metadata: &mut ConversationMetadata,
        user_text: &str,
        records: &[ToolCallRecord],
    ) {
        if let Some((from, to)) = Self::detect_correction(user_text) {
            let from = from.or_else(|| {
                metadata
                    .latest_entity(EntityKind::Product)
                    .map(|e| e.label.clone())
            });
            if let Some(from) = from {
                Self::track_correction(metadata, from, to, "product");
            }
        }

        for record in records {
            let ToolOutcome::Success { value } = &record.outcome else {
                continue;
            };
            match record.name.as_str() {
                "search_products" | "get_product_details" => {
                    if let Ok(report) = serde_json::from_value::<SearchReport>(value.clone()) {
                        Self::absorb_report(metadata, &report);
                    }
                }
                "check_order_status" => {
                    if let Some(order_ref) = value.get("order_ref").and_then(Value::as_str) {
                        Self::track_entity(
                            metadata,
                            EntityKind::Order,
                            TrackedEntity::new(format!("#{order_ref}"), order_ref),
                        );
                    }
                }
                _ => {}
            }
        }

        Self::update_summary(metadata, user_text);
    }

    /// Roll the free-text summary forward, keeping the most recent tail.
    pub fn update_summary(metadata: &mut ConversationMetadata, user_text: &str) {
        let line = clip(user_text.trim(), 80);
        if line.is_empty() {
            return;
        }
        metadata.summary = if metadata.summary.is_empty() {
            format!("asked: {line}")
        } else {
            format!("{}; asked: {line}", metadata.summary)
        };
        let total = metadata.summary.chars().count();
        if total > SUMMARY_MAX_CHARS {
            metadata.summary = metadata
                .summary
                .chars()
                .skip(total - SUMMARY_MAX_CHARS)
                .collect();
        }
    }

    fn absorb_report(metadata: &mut ConversationMetadata, report: &SearchReport) {
        match report.results.len() {
            0 => {}
            1 => {
                let result = &report.results[0];
                let kind = match result.source {
                    SearchSource::Semantic => EntityKind::Page,
                    _ => EntityKind::Product,
                };
                Self::track_entity(metadata, kind, entity_from_payload(result));
            }
            _ => {
                let items = report.results.iter().map(entity_from_payload).collect();
                Self::track_list(metadata, items);
            }
        }
    }

    /// Rewrite a resolution through the correction log, most recent
    /// correction winning, following chains (X corrected to Y, Y to Z).
    fn apply_corrections(
        metadata: &ConversationMetadata,
        mut resolved: ResolvedReference,
    ) -> ResolvedReference {
        let mut label = resolved.entity.label.clone();
        let mut corrected = false;
        let mut from_index = 0usize;
        loop {
            let next = metadata
                .corrections
                .iter()
                .enumerate()
                .skip(from_index)
                .filter(|(_, c)| c.from.eq_ignore_ascii_case(&label))
                .next_back();
            match next {
                Some((i, correction)) => {
                    label = correction.to.clone();
                    corrected = true;
                    from_index = i + 1;
                }
                None => break,
            }
        }

        if corrected {
            resolved.corrected = true;
            match find_by_label(metadata, &label) {
                Some(entity) => resolved.entity = entity.clone(),
                None => resolved.entity.label = label,
            }
        }
        resolved
    }
}

/// Latest tracked entity carrying the given label, across all kinds.
fn find_by_label<'a>(
    metadata: &'a ConversationMetadata,
    label: &str,
) -> Option<&'a TrackedEntity> {
    metadata
        .entities
        .values()
        .flatten()
        .filter(|e| e.label.eq_ignore_ascii_case(label))
        .max_by_key(|e| e.mentioned_at)
}

fn entity_from_payload(result: &SearchResult) -> TrackedEntity {
    let label = result
        .payload
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| result.payload.get("title").and_then(Value::as_str))
        .unwrap_or(&result.product_id)
        .to_string();
    let mut entity = TrackedEntity::new(label, result.product_id.clone());
    if let Some(url) = result.payload.get("url").and_then(Value::as_str) {
        entity = entity.with_url(url);
    }
    entity
}

fn trim_phrase(s: &str) -> String {
    let trimmed = s
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
        .to_string();
    match trimmed.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => trimmed,
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut clipped: String = s.chars().take(max_chars).collect();
        clipped.push_str("...");
        clipped
    }
}
