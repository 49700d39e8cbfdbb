//! In-memory semantic index.
//!
//! Embeds documents at insert time with a pluggable embedder and answers
//! queries by cosine similarity. The default embedder is a hashed
//! bag-of-words: crude, but deterministic and dependency-free, which is
//! what tests and single-node deployments need.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use patter_core::search::vector::VectorSearch;
use patter_types::error::VectorSearchError;
use patter_types::search::{SearchResult, SearchSource};

type Embedder = Box<dyn Fn(&str) -> Vec<f32> + Send + Sync>;

/// A document to index for one domain.
#[derive(Debug, Clone)]
pub struct IndexedDoc {
    pub product_id: String,
    pub text: String,
    pub payload: Value,
    pub indexed_at: Option<DateTime<Utc>>,
}

impl IndexedDoc {
    pub fn new(product_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            text: text.into(),
            payload: Value::Null,
            indexed_at: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_indexed_at(mut self, indexed_at: DateTime<Utc>) -> Self {
        self.indexed_at = Some(indexed_at);
        self
    }
}

/// Cosine-similarity index keyed by domain id.
pub struct InMemoryVectorSearch {
    embedder: Embedder,
    docs: DashMap<i64, Vec<(IndexedDoc, Vec<f32>)>>,
}

impl InMemoryVectorSearch {
    /// Index with the default hashed bag-of-words embedder.
    pub fn new() -> Self {
        Self::with_embedder(hashed_embedder(256))
    }

    pub fn with_embedder(embedder: impl Fn(&str) -> Vec<f32> + Send + Sync + 'static) -> Self {
        Self {
            embedder: Box::new(embedder),
            docs: DashMap::new(),
        }
    }

    /// Add a document to a domain's index. Re-indexing a product id
    /// replaces its previous entry.
    pub fn index(&self, domain_id: i64, doc: IndexedDoc) {
        let embedding = (self.embedder)(&doc.text);
        let mut entry = self.docs.entry(domain_id).or_default();
        entry.retain(|(existing, _)| existing.product_id != doc.product_id);
        entry.push((doc, embedding));
    }

    pub fn doc_count(&self, domain_id: i64) -> usize {
        self.docs.get(&domain_id).map_or(0, |e| e.len())
    }
}

impl Default for InMemoryVectorSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorSearch for InMemoryVectorSearch {
    async fn search(
        &self,
        text: &str,
        domain_id: i64,
        limit: u32,
        threshold: f64,
    ) -> Result<Vec<SearchResult>, VectorSearchError> {
        let Some(entry) = self.docs.get(&domain_id) else {
            return Ok(Vec::new());
        };

        let query = (self.embedder)(text);
        let mut results: Vec<SearchResult> = entry
            .iter()
            .filter_map(|(doc, embedding)| {
                let score = cosine(&query, embedding);
                (score >= threshold).then(|| SearchResult {
                    source: SearchSource::Semantic,
                    product_id: doc.product_id.clone(),
                    score,
                    payload: doc.payload.clone(),
                    indexed_at: doc.indexed_at,
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit as usize);
        Ok(results)
    }
}

/// Cosine similarity with f64 accumulation. Mismatched lengths and
/// zero-norm vectors score 0.0 instead of poisoning the ranking with NaN.
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x).powi(2);
        norm_b += f64::from(*y).powi(2);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Hashed bag-of-words embedder over lowercase alphanumeric tokens.
///
/// `DefaultHasher::new()` is fixed-seed, so the same text always embeds to
/// the same vector within and across runs.
pub fn hashed_embedder(dims: usize) -> impl Fn(&str) -> Vec<f32> + Send + Sync {
    move |text| {
        let mut vector = vec![0.0f32; dims];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % dims;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InMemoryVectorSearch {
        let index = InMemoryVectorSearch::new();
        index.index(
            1,
            IndexedDoc::new("p1", "blue ceramic mug").with_payload(serde_json::json!({"n": "mug"})),
        );
        index.index(1, IndexedDoc::new("p2", "red wool scarf"));
        index.index(1, IndexedDoc::new("p3", "ceramic mug gift set"));
        index
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert_eq!(cosine(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn embedder_is_deterministic() {
        let embed = hashed_embedder(64);
        assert_eq!(embed("Ceramic Mug"), embed("ceramic mug"));
        assert_ne!(embed("ceramic mug"), embed("wool scarf"));
    }

    #[tokio::test]
    async fn overlapping_terms_rank_higher() {
        let hits = catalog().search("ceramic mug", 1, 10, 0.2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits.iter().all(|h| h.product_id != "p2"));
        assert!(hits.iter().all(|h| h.source == SearchSource::Semantic));
    }

    #[tokio::test]
    async fn identical_text_scores_near_one() {
        let hits = catalog().search("blue ceramic mug", 1, 10, 0.2).await.unwrap();
        assert_eq!(hits[0].product_id, "p1");
        assert!(hits[0].score > 0.99);
        assert_eq!(hits[0].payload, serde_json::json!({"n": "mug"}));
    }

    #[tokio::test]
    async fn threshold_filters_weak_matches() {
        let hits = catalog().search("ceramic mug", 1, 10, 0.95).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn limit_caps_the_result_count() {
        let hits = catalog().search("ceramic mug", 1, 1, 0.2).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn unknown_domain_is_empty() {
        let hits = catalog().search("ceramic mug", 99, 10, 0.2).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn domains_are_isolated() {
        let index = catalog();
        index.index(2, IndexedDoc::new("q1", "ceramic mug"));

        let hits = index.search("ceramic mug", 2, 10, 0.2).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product_id, "q1");
    }

    #[tokio::test]
    async fn reindexing_replaces_the_previous_entry() {
        let index = InMemoryVectorSearch::new();
        index.index(1, IndexedDoc::new("p1", "ceramic mug"));
        index.index(1, IndexedDoc::new("p1", "travel mug"));

        assert_eq!(index.doc_count(1), 1);
        let hits = index.search("travel mug", 1, 10, 0.2).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.99);
    }
}
