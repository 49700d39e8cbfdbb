//! CommerceProvider trait definition.
//!
//! One implementation per store platform. The search orchestrator and tool
//! executor only ever see this interface, so platform differences (REST vs
//! GraphQL, auth schemes) stay in patter-infra.

use patter_types::commerce::{CommercePlatform, OrderStatus, Product};
use patter_types::error::CommerceError;

/// Trait for store platform clients (WooCommerce, Shopify, test stubs).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Methods map
/// to catalog reads only; nothing here mutates the store.
pub trait CommerceProvider: Send + Sync {
    /// Platform this client talks to.
    fn platform(&self) -> CommercePlatform;

    /// Free-text catalog search, best-ranked first.
    fn search_products(
        &self,
        query: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Product>, CommerceError>> + Send;

    /// Exact lookup by SKU. Ok(None) means the SKU is genuinely absent.
    fn find_by_sku(
        &self,
        sku: &str,
    ) -> impl std::future::Future<Output = Result<Option<Product>, CommerceError>> + Send;

    /// Order lookup by reference. Platforms without order access return
    /// `CommerceError::Unsupported`.
    fn order_status(
        &self,
        order_ref: &str,
    ) -> impl std::future::Future<Output = Result<Option<OrderStatus>, CommerceError>> + Send;
}
