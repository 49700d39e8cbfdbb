//! VectorSearch trait definition for the semantic fallback stage.
//!
//! Implementations live in patter-infra: an HTTP client for the hosted
//! index and an in-memory index for tests and small deployments.

use std::future::Future;
use std::pin::Pin;

use patter_types::error::VectorSearchError;
use patter_types::search::SearchResult;

/// Semantic index over a tenant's crawled content.
///
/// Implementations apply the similarity threshold themselves and return
/// hits best-first; the orchestrator only re-ranks for recency ties.
pub trait VectorSearch: Send + Sync {
    fn search(
        &self,
        text: &str,
        domain_id: i64,
        limit: u32,
        threshold: f64,
    ) -> impl Future<Output = Result<Vec<SearchResult>, VectorSearchError>> + Send;
}

/// Object-safe version of [`VectorSearch`] with boxed futures.
pub trait VectorSearchDyn: Send + Sync {
    fn search_boxed<'a>(
        &'a self,
        text: &'a str,
        domain_id: i64,
        limit: u32,
        threshold: f64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SearchResult>, VectorSearchError>> + Send + 'a>>;
}

/// Blanket implementation: any `VectorSearch` automatically implements
/// `VectorSearchDyn`.
impl<T: VectorSearch> VectorSearchDyn for T {
    fn search_boxed<'a>(
        &'a self,
        text: &'a str,
        domain_id: i64,
        limit: u32,
        threshold: f64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SearchResult>, VectorSearchError>> + Send + 'a>>
    {
        Box::pin(self.search(text, domain_id, limit, threshold))
    }
}

/// Type-erased vector search backend.
pub struct BoxVectorSearch {
    inner: Box<dyn VectorSearchDyn + Send + Sync>,
}

impl BoxVectorSearch {
    /// Wrap a concrete `VectorSearch` in a type-erased box.
    pub fn new<T: VectorSearch + 'static>(search: T) -> Self {
        Self {
            inner: Box::new(search),
        }
    }

    /// Search indexed content for a domain.
    pub async fn search(
        &self,
        text: &str,
        domain_id: i64,
        limit: u32,
        threshold: f64,
    ) -> Result<Vec<SearchResult>, VectorSearchError> {
        self.inner.search_boxed(text, domain_id, limit, threshold).await
    }
}
