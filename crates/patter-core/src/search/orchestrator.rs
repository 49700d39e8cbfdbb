//! Layered search dispatch.
//!
//! Stage order: exact SKU lookup, commerce catalog search, semantic index.
//! Each stage runs only if the previous one yielded nothing. A stage error
//! is logged and falls through like an empty result, but the exhausted
//! report distinguishes "nothing exists" from "could not check": the model
//! must never tell a shopper an item does not exist because an upstream
//! was down.

use std::sync::Arc;

use patter_types::commerce::Product;
use patter_types::config::SearchConfig;
use patter_types::event::TurnEvent;
use patter_types::search::{ExhaustedCause, SearchReport, SearchResult, SearchSource};
use patter_types::tenant::TenantConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::commerce::resolver::{ProviderHandle, ProviderResolver};
use crate::event::bus::EventBus;

use super::domain::DomainIdResolver;
use super::sku::looks_like_sku;
use super::vector::BoxVectorSearch;

/// Runs the staged dispatch against a tenant's commerce backend and
/// semantic index.
pub struct SearchOrchestrator {
    resolver: Arc<ProviderResolver>,
    domains: DomainIdResolver,
    vector: BoxVectorSearch,
    config: SearchConfig,
    bus: EventBus,
}

impl SearchOrchestrator {
    pub fn new(
        resolver: Arc<ProviderResolver>,
        domains: DomainIdResolver,
        vector: BoxVectorSearch,
        config: SearchConfig,
        bus: EventBus,
    ) -> Self {
        Self {
            resolver,
            domains,
            vector,
            config,
            bus,
        }
    }

    /// Full layered dispatch for a free-text query.
    pub async fn dispatch(
        &self,
        tenant: &TenantConfig,
        query: &str,
        limit: Option<u32>,
    ) -> SearchReport {
        let limit = limit
            .unwrap_or(self.config.search_limit)
            .clamp(1, self.config.search_limit);
        let provider = self.resolver.resolve(tenant).await;
        // None despite configuration means the backend could not be reached.
        let mut provider_degraded = provider.is_none() && tenant.commerce_configured();

        if looks_like_sku(query) {
            if let Some(handle) = &provider {
                match handle.client.find_by_sku(query.trim()).await {
                    Ok(Some(product)) => {
                        debug!(domain = %handle.domain, sku = query, "exact SKU hit");
                        return SearchReport::found(
                            query,
                            SearchSource::ExactMatch,
                            vec![product_hit(SearchSource::ExactMatch, &product)],
                        );
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(domain = %handle.domain, error = %err, "SKU lookup failed");
                        provider_degraded = true;
                    }
                }
            }
        }

        if let Some(handle) = &provider {
            match handle.client.search_products(query, limit).await {
                Ok(products) if !products.is_empty() => {
                    let results = products
                        .iter()
                        .map(|p| product_hit(SearchSource::Commerce, p))
                        .collect();
                    return SearchReport::found(query, SearchSource::Commerce, results);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(domain = %handle.domain, error = %err, "commerce search failed");
                    provider_degraded = true;
                }
            }
        }

        let mut domain_lookup_failed = false;
        let mut vector_failed = false;
        match self.domains.resolve(&tenant.domain).await {
            Ok(Some(domain_id)) => {
                match self
                    .vector
                    .search(query, domain_id, limit, self.config.semantic_threshold)
                    .await
                {
                    Ok(hits) if !hits.is_empty() => {
                        return SearchReport::found(
                            query,
                            SearchSource::Semantic,
                            rank_semantic(hits, limit),
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(domain = %tenant.domain, error = %err, "semantic search failed");
                        vector_failed = true;
                    }
                }
            }
            Ok(None) => {
                warn!(domain = %tenant.domain, "domain has no internal id");
                domain_lookup_failed = true;
            }
            Err(err) => {
                warn!(domain = %tenant.domain, error = %err, "domain id resolution failed");
                domain_lookup_failed = true;
            }
        }

        let cause = if domain_lookup_failed {
            ExhaustedCause::DomainLookupFailed
        } else if provider_degraded || vector_failed {
            ExhaustedCause::ProviderUnavailable
        } else {
            ExhaustedCause::NoMatches
        };
        self.bus.publish(TurnEvent::SearchExhausted {
            domain: tenant.domain.clone(),
            query: query.to_string(),
            cause,
        });
        SearchReport::exhausted(query, cause)
    }

    /// Targeted lookup for one product reference (SKU or id).
    ///
    /// Tries the commerce backend's exact lookup, then the semantic index
    /// with the reference as query text. Same exhausted-cause rules as
    /// `dispatch`.
    pub async fn product_by_ref(&self, tenant: &TenantConfig, product_ref: &str) -> SearchReport {
        if let Some(handle) = self.resolver.resolve(tenant).await {
            match handle.client.find_by_sku(product_ref.trim()).await {
                Ok(Some(product)) => {
                    return SearchReport::found(
                        product_ref,
                        SearchSource::ExactMatch,
                        vec![product_hit(SearchSource::ExactMatch, &product)],
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(domain = %handle.domain, error = %err, "product lookup failed");
                    self.bus.publish(TurnEvent::SearchExhausted {
                        domain: tenant.domain.clone(),
                        query: product_ref.to_string(),
                        cause: ExhaustedCause::ProviderUnavailable,
                    });
                    return SearchReport::exhausted(
                        product_ref,
                        ExhaustedCause::ProviderUnavailable,
                    );
                }
            }
        }
        self.dispatch(tenant, product_ref, Some(1)).await
    }
}

fn product_hit(source: SearchSource, product: &Product) -> SearchResult {
    SearchResult {
        source,
        product_id: product.id.clone(),
        score: 1.0,
        payload: serde_json::to_value(product).unwrap_or(Value::Null),
        indexed_at: None,
    }
}

/// Order semantic hits by score, breaking ties toward more recently
/// indexed content, and cap at the requested limit.
fn rank_semantic(mut hits: Vec<SearchResult>, limit: u32) -> Vec<SearchResult> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.indexed_at.cmp(&a.indexed_at))
    });
    hits.truncate(limit as usize);
    hits
}
