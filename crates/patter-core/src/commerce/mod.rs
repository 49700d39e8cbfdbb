//! Commerce backend abstractions for Patter.
//!
//! This module defines how the engine talks to a tenant's store platform:
//! - `CommerceProvider`: RPITIT trait for platform clients
//! - `BoxCommerceProvider`: object-safe wrapper for runtime platform selection
//! - `ProviderResolver`: detector chain with TTL-cached resolution per domain
//!
//! Platform clients and detectors live in `patter-infra` (WooCommerce REST,
//! Shopify Storefront).

pub mod boxed;
pub mod provider;
pub mod resolver;
