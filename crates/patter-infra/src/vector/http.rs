//! HTTP client for a hosted semantic index.
//!
//! The service embeds crawled tenant content out of band; this client only
//! issues search calls. One endpoint: `POST {base}/search`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use patter_core::search::vector::VectorSearch;
use patter_types::error::VectorSearchError;
use patter_types::search::{SearchResult, SearchSource};

/// Client for the hosted vector search service.
pub struct HttpVectorSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpVectorSearch {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }
}

// HttpVectorSearch intentionally does NOT derive Debug so the key-holding
// struct can never be printed wholesale.

impl VectorSearch for HttpVectorSearch {
    async fn search(
        &self,
        text: &str,
        domain_id: i64,
        limit: u32,
        threshold: f64,
    ) -> Result<Vec<SearchResult>, VectorSearchError> {
        let body = SearchBody {
            text,
            domain_id,
            limit,
            threshold,
        };

        let mut request = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| VectorSearchError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorSearchError::Search(format!("HTTP {status}: {body}")));
        }

        let wire: SearchHits = response
            .json()
            .await
            .map_err(|e| VectorSearchError::Search(format!("failed to parse response: {e}")))?;

        Ok(to_results(wire.hits, threshold, limit))
    }
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    text: &'a str,
    domain_id: i64,
    limit: u32,
    threshold: f64,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<HitRow>,
}

#[derive(Debug, Deserialize)]
struct HitRow {
    product_id: String,
    score: f64,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    indexed_at: Option<DateTime<Utc>>,
}

/// Hits below the threshold never leave this client, whatever the service
/// returned; ordering is re-established locally for the same reason.
fn to_results(hits: Vec<HitRow>, threshold: f64, limit: u32) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = hits
        .into_iter()
        .filter(|h| h.score >= threshold)
        .map(|h| SearchResult {
            source: SearchSource::Semantic,
            product_id: h.product_id,
            score: h.score,
            payload: h.payload,
            indexed_at: h.indexed_at,
        })
        .collect();
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit as usize);
    results
}
