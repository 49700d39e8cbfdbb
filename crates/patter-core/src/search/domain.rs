//! Domain normalization and cached domain-id resolution.
//!
//! Tenants are addressed by customer domain at the edge but by numeric id in
//! the semantic index. Stored domains are not perfectly uniform (with and
//! without `www.`, sometimes a full URL), so resolution probes a small set
//! of alternate forms before giving up.

use std::sync::Arc;

use patter_types::error::StoreError;
use tracing::warn;

use crate::cache::{Clock, TtlCache};
use crate::store::BoxDomainLookup;

/// Normalize a domain for cache keys and lookups: lowercase, strip scheme,
/// path, port, and trailing dots.
pub fn normalize_domain(input: &str) -> String {
    let mut s = input.trim().to_lowercase();
    if let Some(rest) = s.strip_prefix("https://") {
        s = rest.to_string();
    } else if let Some(rest) = s.strip_prefix("http://") {
        s = rest.to_string();
    }
    if let Some((host, _)) = s.split_once('/') {
        s = host.to_string();
    }
    if let Some((host, _)) = s.split_once(':') {
        s = host.to_string();
    }
    s.trim_end_matches('.').to_string()
}

/// Lookup forms to probe, in order: the normalized domain, its www-toggled
/// twin, and the raw input when it differs from both.
fn candidate_forms(normalized: &str, raw: &str) -> Vec<String> {
    let mut forms = vec![normalized.to_string()];
    let toggled = match normalized.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => format!("www.{normalized}"),
    };
    if toggled != normalized {
        forms.push(toggled);
    }
    let raw = raw.trim().to_string();
    if !raw.is_empty() && !forms.contains(&raw) {
        forms.push(raw);
    }
    forms
}

/// TTL-cached domain-to-id resolution over a [`crate::store::DomainLookup`].
///
/// Every probe goes straight to the underlying lookup; the cache sits only
/// in front of the whole chain, keyed by normalized domain. Misses are
/// cached too, but never when a probe errored, so a store outage does not
/// poison the window.
pub struct DomainIdResolver {
    lookup: BoxDomainLookup,
    cache: TtlCache<String, Option<i64>>,
}

impl DomainIdResolver {
    pub fn new(lookup: BoxDomainLookup, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            lookup,
            cache: TtlCache::new(ttl_secs, clock),
        }
    }

    /// Resolve a domain to its internal id.
    ///
    /// `Ok(None)` means every form was checked and none is known. `Err`
    /// means at least one probe failed and no form matched, so absence
    /// could not be established.
    pub async fn resolve(&self, domain: &str) -> Result<Option<i64>, StoreError> {
        let normalized = normalize_domain(domain);
        if let Some(cached) = self.cache.get(&normalized) {
            return Ok(cached);
        }

        let mut last_err: Option<StoreError> = None;
        for form in candidate_forms(&normalized, domain) {
            match self.lookup.domain_id(&form).await {
                Ok(Some(id)) => {
                    self.cache.insert(normalized, Some(id));
                    return Ok(Some(id));
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!(domain = %form, error = %err, "domain lookup probe failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(err),
            None => {
                self.cache.insert(normalized, None);
                Ok(None)
            }
        }
    }
}
