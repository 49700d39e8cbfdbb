//! Search dispatch types for Patter.
//!
//! A `SearchReport` is the outcome of the full layered dispatch: the ranked
//! results and the stage that produced them, or a diagnostic cause when every
//! stage came up empty. The cause distinction is load-bearing: an
//! infrastructure failure must never be presented as an empty catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which stage of the dispatch produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    ExactMatch,
    Commerce,
    Semantic,
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchSource::ExactMatch => write!(f, "exact_match"),
            SearchSource::Commerce => write!(f, "commerce"),
            SearchSource::Semantic => write!(f, "semantic"),
        }
    }
}

impl FromStr for SearchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact_match" => Ok(SearchSource::ExactMatch),
            "commerce" => Ok(SearchSource::Commerce),
            "semantic" => Ok(SearchSource::Semantic),
            other => Err(format!("invalid search source: '{other}'")),
        }
    }
}

/// Why a dispatch produced no results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedCause {
    /// Every stage ran and genuinely found nothing.
    NoMatches,
    /// The commerce provider could not be reached or resolved.
    ProviderUnavailable,
    /// The domain could not be mapped to an internal id for semantic search.
    DomainLookupFailed,
}

impl ExhaustedCause {
    /// Whether this cause means "we could not check", as opposed to
    /// "we checked and nothing exists".
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ExhaustedCause::ProviderUnavailable | ExhaustedCause::DomainLookupFailed
        )
    }
}

impl fmt::Display for ExhaustedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustedCause::NoMatches => write!(f, "no_matches"),
            ExhaustedCause::ProviderUnavailable => write!(f, "provider_unavailable"),
            ExhaustedCause::DomainLookupFailed => write!(f, "domain_lookup_failed"),
        }
    }
}

impl FromStr for ExhaustedCause {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no_matches" => Ok(ExhaustedCause::NoMatches),
            "provider_unavailable" => Ok(ExhaustedCause::ProviderUnavailable),
            "domain_lookup_failed" => Ok(ExhaustedCause::DomainLookupFailed),
            other => Err(format!("invalid exhausted cause: '{other}'")),
        }
    }
}

/// A single ranked hit from any search stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub source: SearchSource,
    pub product_id: String,
    /// Relevance score; exact and commerce hits use 1.0.
    pub score: f64,
    /// Raw stage payload (product JSON, indexed chunk, ...).
    pub payload: serde_json::Value,
    /// When the underlying content was indexed (semantic hits only);
    /// used as a recency tie-break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

/// Outcome of the full layered dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Stage that produced the results; None when exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SearchSource>,
    /// Diagnostic cause; None when results were found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhausted: Option<ExhaustedCause>,
}

impl SearchReport {
    /// A report carrying results from one stage.
    pub fn found(
        query: impl Into<String>,
        source: SearchSource,
        results: Vec<SearchResult>,
    ) -> Self {
        Self {
            query: query.into(),
            results,
            source: Some(source),
            exhausted: None,
        }
    }

    /// A report for a dispatch where every stage came up empty.
    pub fn exhausted(query: impl Into<String>, cause: ExhaustedCause) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            source: None,
            exhausted: Some(cause),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether the empty result reflects an infrastructure failure rather
    /// than a genuinely empty catalog.
    pub fn infrastructure_failure(&self) -> bool {
        self.exhausted.is_some_and(|c| c.is_infrastructure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f64) -> SearchResult {
        SearchResult {
            source: SearchSource::Semantic,
            product_id: id.to_string(),
            score,
            payload: serde_json::json!({"id": id}),
            indexed_at: None,
        }
    }

    #[test]
    fn test_search_source_roundtrip() {
        for source in [
            SearchSource::ExactMatch,
            SearchSource::Commerce,
            SearchSource::Semantic,
        ] {
            let s = source.to_string();
            let parsed: SearchSource = s.parse().unwrap();
            assert_eq!(source, parsed);
        }
    }

    #[test]
    fn test_exhausted_cause_roundtrip() {
        for cause in [
            ExhaustedCause::NoMatches,
            ExhaustedCause::ProviderUnavailable,
            ExhaustedCause::DomainLookupFailed,
        ] {
            let s = cause.to_string();
            let parsed: ExhaustedCause = s.parse().unwrap();
            assert_eq!(cause, parsed);
        }
    }

    #[test]
    fn test_infrastructure_causes() {
        assert!(!ExhaustedCause::NoMatches.is_infrastructure());
        assert!(ExhaustedCause::ProviderUnavailable.is_infrastructure());
        assert!(ExhaustedCause::DomainLookupFailed.is_infrastructure());
    }

    #[test]
    fn test_found_report_shape() {
        let report = SearchReport::found("mug", SearchSource::Commerce, vec![hit("p1", 1.0)]);
        assert!(!report.is_empty());
        assert_eq!(report.source, Some(SearchSource::Commerce));
        assert!(report.exhausted.is_none());
        assert!(!report.infrastructure_failure());
    }

    #[test]
    fn test_exhausted_report_shape() {
        let report = SearchReport::exhausted("mug", ExhaustedCause::ProviderUnavailable);
        assert!(report.is_empty());
        assert!(report.source.is_none());
        assert!(report.infrastructure_failure());
    }

    #[test]
    fn test_report_serde_roundtrip() {
        let report = SearchReport::exhausted("mug", ExhaustedCause::DomainLookupFailed);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"exhausted\":\"domain_lookup_failed\""));
        let parsed: SearchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
