//! Commerce platform clients and detectors.
//!
//! Concrete implementations of the [`CommerceProvider`] and
//! [`ProviderDetector`] traits defined in `patter-core`: WooCommerce over
//! the REST v3 API and Shopify over the Storefront GraphQL API. Platform
//! differences (auth schemes, wire shapes, order access) end here; the rest
//! of the engine sees only the traits.
//!
//! [`CommerceProvider`]: patter_core::commerce::provider::CommerceProvider
//! [`ProviderDetector`]: patter_core::commerce::resolver::ProviderDetector

pub mod shopify;
pub mod woocommerce;

use patter_core::commerce::resolver::BoxProviderDetector;
use patter_types::error::ResolveError;
use secrecy::SecretString;

use self::shopify::ShopifyDetector;
use self::woocommerce::WooCommerceDetector;

/// The standard detector chain, probed in order.
pub fn default_detectors() -> Vec<BoxProviderDetector> {
    vec![
        BoxProviderDetector::new(WooCommerceDetector),
        BoxProviderDetector::new(ShopifyDetector),
    ]
}

/// Read a credential named by tenant config from the environment.
///
/// Tenant files carry env var names, never secret values; this is the one
/// place those names are dereferenced.
pub(crate) fn read_credential(env_var: &str) -> Result<SecretString, ResolveError> {
    match std::env::var(env_var) {
        Ok(val) if !val.is_empty() => Ok(SecretString::from(val)),
        _ => Err(ResolveError::MissingCredentials(env_var.to_string())),
    }
}
