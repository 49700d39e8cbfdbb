//! BoxCommerceProvider -- object-safe wrapper for CommerceProvider.
//!
//! Same blanket-impl pattern as `BoxModelClient`: an object-safe `*Dyn`
//! trait with boxed futures, a blanket impl, and a wrapper that delegates.

use std::future::Future;
use std::pin::Pin;

use patter_types::commerce::{CommercePlatform, OrderStatus, Product};
use patter_types::error::CommerceError;

use super::provider::CommerceProvider;

/// Object-safe version of [`CommerceProvider`] with boxed futures.
pub trait CommerceProviderDyn: Send + Sync {
    fn platform(&self) -> CommercePlatform;

    fn search_products_boxed<'a>(
        &'a self,
        query: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Product>, CommerceError>> + Send + 'a>>;

    fn find_by_sku_boxed<'a>(
        &'a self,
        sku: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, CommerceError>> + Send + 'a>>;

    fn order_status_boxed<'a>(
        &'a self,
        order_ref: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<OrderStatus>, CommerceError>> + Send + 'a>>;
}

/// Blanket implementation: any `CommerceProvider` automatically implements
/// `CommerceProviderDyn`.
impl<T: CommerceProvider> CommerceProviderDyn for T {
    fn platform(&self) -> CommercePlatform {
        CommerceProvider::platform(self)
    }

    fn search_products_boxed<'a>(
        &'a self,
        query: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Product>, CommerceError>> + Send + 'a>> {
        Box::pin(self.search_products(query, limit))
    }

    fn find_by_sku_boxed<'a>(
        &'a self,
        sku: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, CommerceError>> + Send + 'a>> {
        Box::pin(self.find_by_sku(sku))
    }

    fn order_status_boxed<'a>(
        &'a self,
        order_ref: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<OrderStatus>, CommerceError>> + Send + 'a>> {
        Box::pin(self.order_status(order_ref))
    }
}

/// Type-erased commerce provider.
///
/// The resolver picks the platform at runtime, so handles carry this
/// wrapper rather than a concrete client type.
pub struct BoxCommerceProvider {
    inner: Box<dyn CommerceProviderDyn + Send + Sync>,
}

impl std::fmt::Debug for BoxCommerceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxCommerceProvider")
            .field("platform", &self.platform())
            .finish_non_exhaustive()
    }
}

impl BoxCommerceProvider {
    /// Wrap a concrete `CommerceProvider` in a type-erased box.
    pub fn new<T: CommerceProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Platform this client talks to.
    pub fn platform(&self) -> CommercePlatform {
        self.inner.platform()
    }

    /// Free-text catalog search, best-ranked first.
    pub async fn search_products(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Product>, CommerceError> {
        self.inner.search_products_boxed(query, limit).await
    }

    /// Exact lookup by SKU.
    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, CommerceError> {
        self.inner.find_by_sku_boxed(sku).await
    }

    /// Order lookup by reference.
    pub async fn order_status(&self, order_ref: &str) -> Result<Option<OrderStatus>, CommerceError> {
        self.inner.order_status_boxed(order_ref).await
    }
}
