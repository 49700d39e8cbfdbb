//! Repository trait definitions for conversation and tenant persistence.
//!
//! Implementations live in patter-infra (e.g. `SqliteConversationStore`).
//! All traits use native async fn in traits (RPITIT, Rust 2024 edition);
//! `DomainLookup` additionally gets a boxed form because the search
//! orchestrator holds it type-erased.

use std::future::Future;
use std::pin::Pin;

use patter_types::conversation::Conversation;
use patter_types::error::{ConfigError, StoreError};
use patter_types::tenant::TenantConfig;
use uuid::Uuid;

/// Repository trait for conversation persistence.
///
/// `save` is an upsert: it writes the conversation row and appends any
/// messages not yet persisted.
pub trait ConversationStore: Send + Sync {
    /// Load a conversation with its full message history.
    fn load(
        &self,
        conversation_id: &Uuid,
    ) -> impl Future<Output = Result<Option<Conversation>, StoreError>> + Send;

    /// Persist a conversation, its new messages, and its metadata snapshot.
    fn save(
        &self,
        conversation: &Conversation,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Read-only source of per-tenant configuration, keyed by domain.
pub trait TenantConfigSource: Send + Sync {
    /// Fetch the configuration for a domain, or None if the tenant is unknown.
    fn load(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<TenantConfig>, ConfigError>> + Send;
}

/// Maps a customer domain to its internal numeric id.
///
/// Implementations perform one direct lookup per call; normalization,
/// alternate-form probing, and caching live in `DomainIdResolver`.
pub trait DomainLookup: Send + Sync {
    fn domain_id(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<i64>, StoreError>> + Send;
}

/// Object-safe version of [`DomainLookup`] with boxed futures.
pub trait DomainLookupDyn: Send + Sync {
    fn domain_id_boxed<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<i64>, StoreError>> + Send + 'a>>;
}

/// Blanket implementation: any `DomainLookup` automatically implements `DomainLookupDyn`.
impl<T: DomainLookup> DomainLookupDyn for T {
    fn domain_id_boxed<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<i64>, StoreError>> + Send + 'a>> {
        Box::pin(self.domain_id(domain))
    }
}

/// Type-erased domain lookup.
pub struct BoxDomainLookup {
    inner: Box<dyn DomainLookupDyn + Send + Sync>,
}

impl BoxDomainLookup {
    /// Wrap a concrete `DomainLookup` in a type-erased box.
    pub fn new<T: DomainLookup + 'static>(lookup: T) -> Self {
        Self {
            inner: Box::new(lookup),
        }
    }

    /// Look up the internal id for a domain.
    pub async fn domain_id(&self, domain: &str) -> Result<Option<i64>, StoreError> {
        self.inner.domain_id_boxed(domain).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLookup;

    impl DomainLookup for FixedLookup {
        async fn domain_id(&self, domain: &str) -> Result<Option<i64>, StoreError> {
            if domain == "shop.example.com" {
                Ok(Some(42))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn boxed_lookup_delegates() {
        let lookup = BoxDomainLookup::new(FixedLookup);
        assert_eq!(lookup.domain_id("shop.example.com").await.unwrap(), Some(42));
        assert_eq!(lookup.domain_id("other.example.com").await.unwrap(), None);
    }
}
