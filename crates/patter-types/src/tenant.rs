//! Tenant configuration types for Patter.
//!
//! A `TenantConfig` describes one customer's scope in a multi-tenant
//! deployment: which commerce integrations are configured and what limits
//! apply to the reasoning loop. Credentials are never stored here; config
//! carries the names of environment variables that hold them.

use serde::{Deserialize, Serialize};

/// Per-tenant configuration consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Normalized tenant domain (e.g. "shop.example.com").
    pub domain: String,
    #[serde(default)]
    pub integrations: Integrations,
    #[serde(default)]
    pub ai_limits: AiLimits,
}

impl TenantConfig {
    /// Bare config with no integrations and default limits.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            integrations: Integrations::default(),
            ai_limits: AiLimits::default(),
        }
    }

    /// Whether any commerce platform is configured for this tenant.
    pub fn commerce_configured(&self) -> bool {
        self.integrations.woocommerce.is_some() || self.integrations.shopify.is_some()
    }

    /// Whether the configured platform supports order lookup.
    ///
    /// Shopify's storefront API exposes no order access, so only WooCommerce
    /// tenants get the order-status capability.
    pub fn order_lookup_configured(&self) -> bool {
        self.integrations.woocommerce.is_some()
    }
}

/// Which platform integrations a tenant has configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Integrations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woocommerce: Option<WooCommerceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopify: Option<ShopifyConfig>,
}

/// WooCommerce REST API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WooCommerceConfig {
    /// Store base URL (e.g. "https://shop.example.com").
    pub store_url: String,
    /// Name of the env var holding the consumer key.
    pub consumer_key_env: String,
    /// Name of the env var holding the consumer secret.
    pub consumer_secret_env: String,
}

/// Shopify Storefront API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyConfig {
    /// Shop domain (e.g. "example.myshopify.com").
    pub shop_domain: String,
    /// Name of the env var holding the Storefront access token.
    pub access_token_env: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    "2024-07".to_string()
}

/// Bounds on the reasoning loop for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiLimits {
    /// Maximum tool-calling iterations before the loop is forced to finalize.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Per-tool execution timeout in milliseconds.
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,
    /// Optional wall-clock budget for the whole turn in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_budget_ms: Option<u64>,
}

fn default_max_iterations() -> u32 {
    5
}

fn default_tool_timeout_ms() -> u64 {
    10_000
}

impl Default for AiLimits {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_ms: default_tool_timeout_ms(),
            turn_budget_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_limits_defaults() {
        let limits = AiLimits::default();
        assert_eq!(limits.max_iterations, 5);
        assert_eq!(limits.tool_timeout_ms, 10_000);
        assert!(limits.turn_budget_ms.is_none());
    }

    #[test]
    fn test_tenant_config_deserialize_minimal_toml() {
        let toml_str = r#"domain = "shop.example.com""#;
        let config: TenantConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.domain, "shop.example.com");
        assert!(!config.commerce_configured());
        assert_eq!(config.ai_limits.max_iterations, 5);
    }

    #[test]
    fn test_tenant_config_deserialize_with_woocommerce() {
        let toml_str = r#"
domain = "shop.example.com"

[integrations.woocommerce]
store_url = "https://shop.example.com"
consumer_key_env = "SHOP_EXAMPLE_WC_KEY"
consumer_secret_env = "SHOP_EXAMPLE_WC_SECRET"

[ai_limits]
max_iterations = 3
tool_timeout_ms = 5000
"#;
        let config: TenantConfig = toml::from_str(toml_str).unwrap();
        assert!(config.commerce_configured());
        assert!(config.order_lookup_configured());
        assert_eq!(config.ai_limits.max_iterations, 3);
        assert_eq!(config.ai_limits.tool_timeout_ms, 5000);
        let wc = config.integrations.woocommerce.unwrap();
        assert_eq!(wc.store_url, "https://shop.example.com");
    }

    #[test]
    fn test_shopify_tenant_has_no_order_lookup() {
        let toml_str = r#"
domain = "gifts.example.com"

[integrations.shopify]
shop_domain = "gifts-example.myshopify.com"
access_token_env = "GIFTS_EXAMPLE_SF_TOKEN"
"#;
        let config: TenantConfig = toml::from_str(toml_str).unwrap();
        assert!(config.commerce_configured());
        assert!(!config.order_lookup_configured());
        let shopify = config.integrations.shopify.unwrap();
        assert_eq!(shopify.api_version, "2024-07");
    }

    #[test]
    fn test_tenant_config_serde_roundtrip() {
        let config = TenantConfig::new("shop.example.com");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TenantConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.domain, "shop.example.com");
        assert_eq!(parsed.ai_limits.max_iterations, 5);
    }
}
