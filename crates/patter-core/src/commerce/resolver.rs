//! Provider resolution: which platform serves this domain, and a live client
//! for it.
//!
//! Resolution runs a detector chain (one detector per platform) against the
//! tenant's configuration. Results are cached per normalized domain for a
//! short TTL, including negative results, so a burst of turns for the same
//! shop probes each platform at most once per window. A detector error is
//! treated as transient and retried with backoff before the chain moves on.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use patter_types::commerce::CommercePlatform;
use patter_types::config::ResolverConfig;
use patter_types::error::ResolveError;
use patter_types::event::TurnEvent;
use patter_types::tenant::TenantConfig;
use tracing::{debug, info, warn};

use crate::cache::{Clock, TtlCache};
use crate::event::bus::EventBus;
use crate::retry::RetryPolicy;
use crate::search::domain::normalize_domain;

use super::boxed::BoxCommerceProvider;

/// Probes whether a tenant's store runs one specific platform.
///
/// `Ok(None)` means "not this platform" and the chain moves on without
/// retrying; `Err` means the probe itself failed (network, auth backend
/// down) and is retried before giving up on the platform.
pub trait ProviderDetector: Send + Sync {
    /// Platform this detector probes for.
    fn platform(&self) -> CommercePlatform;

    /// Attempt detection, returning a ready client on success.
    fn detect(
        &self,
        tenant: &TenantConfig,
    ) -> impl Future<Output = Result<Option<BoxCommerceProvider>, ResolveError>> + Send;
}

/// Object-safe version of [`ProviderDetector`] with boxed futures.
pub trait ProviderDetectorDyn: Send + Sync {
    fn platform(&self) -> CommercePlatform;

    fn detect_boxed<'a>(
        &'a self,
        tenant: &'a TenantConfig,
    ) -> Pin<Box<dyn Future<Output = Result<Option<BoxCommerceProvider>, ResolveError>> + Send + 'a>>;
}

/// Blanket implementation: any `ProviderDetector` automatically implements
/// `ProviderDetectorDyn`.
impl<T: ProviderDetector> ProviderDetectorDyn for T {
    fn platform(&self) -> CommercePlatform {
        ProviderDetector::platform(self)
    }

    fn detect_boxed<'a>(
        &'a self,
        tenant: &'a TenantConfig,
    ) -> Pin<Box<dyn Future<Output = Result<Option<BoxCommerceProvider>, ResolveError>> + Send + 'a>>
    {
        Box::pin(self.detect(tenant))
    }
}

/// Type-erased detector, so the chain can mix platforms.
pub struct BoxProviderDetector {
    inner: Box<dyn ProviderDetectorDyn + Send + Sync>,
}

impl BoxProviderDetector {
    pub fn new<T: ProviderDetector + 'static>(detector: T) -> Self {
        Self {
            inner: Box::new(detector),
        }
    }

    pub fn platform(&self) -> CommercePlatform {
        self.inner.platform()
    }

    pub async fn detect(
        &self,
        tenant: &TenantConfig,
    ) -> Result<Option<BoxCommerceProvider>, ResolveError> {
        self.inner.detect_boxed(tenant).await
    }
}

/// A resolved, ready-to-use commerce backend for one domain.
///
/// Cheap to clone; the client is shared behind an `Arc`.
#[derive(Clone)]
pub struct ProviderHandle {
    pub platform: CommercePlatform,
    pub domain: String,
    pub client: Arc<BoxCommerceProvider>,
    pub resolved_at: DateTime<Utc>,
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("platform", &self.platform)
            .field("domain", &self.domain)
            .field("resolved_at", &self.resolved_at)
            .finish()
    }
}

/// Detector chain with TTL-cached resolution per domain.
pub struct ProviderResolver {
    cache: TtlCache<String, Option<ProviderHandle>>,
    detectors: Vec<BoxProviderDetector>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    bus: EventBus,
}

impl ProviderResolver {
    pub fn new(
        config: &ResolverConfig,
        detectors: Vec<BoxProviderDetector>,
        clock: Arc<dyn Clock>,
        bus: EventBus,
    ) -> Self {
        Self {
            cache: TtlCache::new(config.provider_cache_ttl_secs, clock.clone()),
            detectors,
            retry: RetryPolicy::exponential(config.detector_retries, config.detector_backoff_ms),
            clock,
            bus,
        }
    }

    /// Resolve the commerce backend for a tenant, or None when no platform
    /// is configured or reachable.
    ///
    /// Both outcomes are cached for the configured TTL. A cached None is a
    /// hit: repeated turns against an unconfigured or unreachable shop do
    /// not re-run the detector chain until the entry expires.
    pub async fn resolve(&self, tenant: &TenantConfig) -> Option<ProviderHandle> {
        let key = normalize_domain(&tenant.domain);

        if let Some(cached) = self.cache.get(&key) {
            if let Some(handle) = &cached {
                self.bus.publish(TurnEvent::ProviderResolved {
                    domain: key,
                    platform: handle.platform.to_string(),
                    from_cache: true,
                });
            }
            return cached;
        }

        if !tenant.commerce_configured() {
            debug!(domain = %key, "no commerce integration configured");
            self.cache.insert(key, None);
            return None;
        }

        let mut detectors_tried = 0u32;
        for detector in &self.detectors {
            detectors_tried += 1;
            match self.probe(detector, tenant).await {
                Ok(Some(client)) => {
                    let handle = ProviderHandle {
                        platform: detector.platform(),
                        domain: key.clone(),
                        client: Arc::new(client),
                        resolved_at: self.clock.now(),
                    };
                    self.cache.insert(key.clone(), Some(handle.clone()));
                    info!(domain = %key, platform = %handle.platform, "commerce provider resolved");
                    self.bus.publish(TurnEvent::ProviderResolved {
                        domain: key,
                        platform: handle.platform.to_string(),
                        from_cache: false,
                    });
                    return Some(handle);
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        domain = %key,
                        platform = %detector.platform(),
                        error = %err,
                        "detector failed after retries"
                    );
                }
            }
        }

        self.cache.insert(key.clone(), None);
        self.bus.publish(TurnEvent::ProviderResolutionFailed {
            domain: key,
            detectors_tried,
        });
        None
    }

    /// Drop the cached entry for a domain so the next resolve re-probes.
    pub fn invalidate(&self, domain: &str) {
        self.cache.invalidate(&normalize_domain(domain));
    }

    /// Run one detector with the configured retry budget.
    async fn probe(
        &self,
        detector: &BoxProviderDetector,
        tenant: &TenantConfig,
    ) -> Result<Option<BoxCommerceProvider>, ResolveError> {
        let mut attempt = 1u32;
        loop {
            match detector.detect(tenant).await {
                Ok(found) => return Ok(found),
                Err(err) if self.retry.should_retry(attempt) => {
                    debug!(
                        platform = %detector.platform(),
                        attempt,
                        error = %err,
                        "detector attempt failed, backing off"
                    );
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
