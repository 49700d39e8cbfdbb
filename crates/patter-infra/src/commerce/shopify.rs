//! Shopify Storefront GraphQL provider and detector.
//!
//! Talks to `https://{shop}/api/{version}/graphql.json` with a Storefront
//! access token header. Product search and SKU lookup ride the same search
//! query; the Storefront API exposes no order access, so order lookup is
//! unsupported on this platform.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use patter_core::commerce::boxed::BoxCommerceProvider;
use patter_core::commerce::provider::CommerceProvider;
use patter_core::commerce::resolver::ProviderDetector;
use patter_types::commerce::{CommercePlatform, OrderStatus, Product};
use patter_types::error::{CommerceError, ResolveError};
use patter_types::tenant::{ShopifyConfig, TenantConfig};

use super::read_credential;

/// GraphQL document used for both free-text search and SKU lookup; the SKU
/// path passes a `sku:` prefixed search term.
const PRODUCT_QUERY: &str = r#"
query($query: String!, $first: Int!) {
  products(first: $first, query: $query) {
    edges {
      node {
        id
        title
        description
        onlineStoreUrl
        availableForSale
        variants(first: 1) {
          edges { node { sku price { amount currencyCode } } }
        }
      }
    }
  }
}"#;

/// Shopify store client over the Storefront GraphQL API.
pub struct ShopifyProvider {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl ShopifyProvider {
    const TOKEN_HEADER: &'static str = "X-Shopify-Storefront-Access-Token";

    pub fn new(config: &ShopifyConfig, access_token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            endpoint: endpoint_for(config),
            access_token,
        }
    }

    /// Build a client from tenant config, resolving the access token from
    /// the environment variable the config names.
    pub fn from_config(config: &ShopifyConfig) -> Result<Self, ResolveError> {
        let access_token = read_credential(&config.access_token_env)?;
        Ok(Self::new(config, access_token))
    }

    /// Override the endpoint (tests, proxies).
    #[allow(dead_code)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run the product query and return the matched nodes.
    async fn execute(&self, variables: Value) -> Result<Vec<ProductNode>, CommerceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(Self::TOKEN_HEADER, self.access_token.expose_secret())
            .json(&GraphQlRequest {
                query: PRODUCT_QUERY,
                variables,
            })
            .send()
            .await
            .map_err(|e| CommerceError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => CommerceError::AuthenticationFailed,
                code => CommerceError::Api {
                    status: code,
                    message: body,
                },
            });
        }

        let wire: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| CommerceError::Deserialization(format!("graphql response: {e}")))?;

        // GraphQL failures come back as 200 with an errors array.
        if !wire.errors.is_empty() {
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: graphql_error_message(wire.errors),
            });
        }

        Ok(wire
            .data
            .map(|d| d.products.edges.into_iter().map(|e| e.node).collect())
            .unwrap_or_default())
    }
}

// ShopifyProvider intentionally does NOT derive Debug so the token-holding
// struct can never be printed wholesale.

impl CommerceProvider for ShopifyProvider {
    fn platform(&self) -> CommercePlatform {
        CommercePlatform::Shopify
    }

    async fn search_products(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Product>, CommerceError> {
        let variables = serde_json::json!({ "query": query, "first": limit });
        let nodes = self.execute(variables).await?;
        Ok(nodes.into_iter().map(ProductNode::into_product).collect())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, CommerceError> {
        let variables = serde_json::json!({ "query": format!("sku:{sku}"), "first": 5 });
        let nodes = self.execute(variables).await?;
        let products = nodes.into_iter().map(ProductNode::into_product).collect();
        Ok(exact_sku_match(products, sku))
    }

    async fn order_status(&self, _order_ref: &str) -> Result<Option<OrderStatus>, CommerceError> {
        Err(CommerceError::Unsupported("order lookup".to_string()))
    }
}

/// Detects Shopify tenants.
///
/// Config-driven like the WooCommerce detector: settings present plus a
/// resolvable access token yields a client; no network probe.
pub struct ShopifyDetector;

impl ProviderDetector for ShopifyDetector {
    fn platform(&self) -> CommercePlatform {
        CommercePlatform::Shopify
    }

    async fn detect(
        &self,
        tenant: &TenantConfig,
    ) -> Result<Option<BoxCommerceProvider>, ResolveError> {
        let Some(config) = &tenant.integrations.shopify else {
            return Ok(None);
        };
        let provider = ShopifyProvider::from_config(config)?;
        Ok(Some(BoxCommerceProvider::new(provider)))
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: &'static str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<ProductsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
struct ProductConnection {
    edges: Vec<ProductEdge>,
}

#[derive(Debug, Deserialize)]
struct ProductEdge {
    node: ProductNode,
}

/// Product node as the Storefront API returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    /// Global id ("gid://shopify/Product/123"); kept verbatim.
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    online_store_url: Option<String>,
    available_for_sale: bool,
    variants: VariantConnection,
}

#[derive(Debug, Deserialize)]
struct VariantConnection {
    edges: Vec<VariantEdge>,
}

#[derive(Debug, Deserialize)]
struct VariantEdge {
    node: VariantNode,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    #[serde(default)]
    sku: Option<String>,
    price: MoneyV2,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyV2 {
    amount: String,
    currency_code: String,
}

impl ProductNode {
    fn into_product(self) -> Product {
        let variant = self.variants.edges.into_iter().next().map(|e| e.node);
        let (sku, price, currency) = match variant {
            Some(v) => (
                v.sku.filter(|s| !s.is_empty()),
                v.price.amount.parse().ok(),
                v.price.currency_code,
            ),
            None => (None, None, "GBP".to_string()),
        };

        Product {
            id: self.id,
            name: self.title,
            sku,
            price,
            currency,
            url: self.online_store_url,
            in_stock: self.available_for_sale,
            description: (!self.description.is_empty()).then_some(self.description),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn endpoint_for(config: &ShopifyConfig) -> String {
    format!(
        "https://{}/api/{}/graphql.json",
        config
            .shop_domain
            .trim_start_matches("https://")
            .trim_end_matches('/'),
        config.api_version
    )
}

/// Storefront search is fuzzy; SKU lookup requires an exact variant match.
fn exact_sku_match(products: Vec<Product>, sku: &str) -> Option<Product> {
    let wanted = sku.to_lowercase();
    products
        .into_iter()
        .find(|p| p.sku.as_deref().is_some_and(|s| s.to_lowercase() == wanted))
}

fn graphql_error_message(errors: Vec<GraphQlError>) -> String {
    errors
        .into_iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shopify_config() -> ShopifyConfig {
        ShopifyConfig {
            shop_domain: "gifts-example.myshopify.com".to_string(),
            access_token_env: "PATTER_TEST_SF_TOKEN_ABSENT".to_string(),
            api_version: "2024-07".to_string(),
        }
    }

    #[test]
    fn endpoint_includes_domain_and_version() {
        assert_eq!(
            endpoint_for(&shopify_config()),
            "https://gifts-example.myshopify.com/api/2024-07/graphql.json"
        );

        let with_scheme = ShopifyConfig {
            shop_domain: "https://gifts-example.myshopify.com/".to_string(),
            ..shopify_config()
        };
        assert_eq!(
            endpoint_for(&with_scheme),
            "https://gifts-example.myshopify.com/api/2024-07/graphql.json"
        );
    }

    #[test]
    fn product_nodes_map_to_neutral_products() {
        let raw = r#"{
            "data": {
                "products": {
                    "edges": [{
                        "node": {
                            "id": "gid://shopify/Product/41",
                            "title": "Enamel Mug",
                            "description": "Camping classic.",
                            "onlineStoreUrl": "https://gifts.example.com/products/enamel-mug",
                            "availableForSale": true,
                            "variants": {
                                "edges": [{
                                    "node": {
                                        "sku": "MUG-041",
                                        "price": {"amount": "18.0", "currencyCode": "USD"}
                                    }
                                }]
                            }
                        }
                    }]
                }
            }
        }"#;
        let wire: GraphQlResponse = serde_json::from_str(raw).unwrap();
        let nodes: Vec<ProductNode> = wire
            .data
            .unwrap()
            .products
            .edges
            .into_iter()
            .map(|e| e.node)
            .collect();
        let product = nodes.into_iter().next().unwrap().into_product();

        assert_eq!(product.id, "gid://shopify/Product/41");
        assert_eq!(product.name, "Enamel Mug");
        assert_eq!(product.sku.as_deref(), Some("MUG-041"));
        assert_eq!(product.price, Some(18.0));
        assert_eq!(product.currency, "USD");
        assert!(product.in_stock);
    }

    #[test]
    fn product_without_variants_keeps_defaults() {
        let raw = r#"{
            "id": "gid://shopify/Product/42",
            "title": "Gift Card",
            "availableForSale": true,
            "variants": {"edges": []}
        }"#;
        let node: ProductNode = serde_json::from_str(raw).unwrap();
        let product = node.into_product();

        assert!(product.sku.is_none());
        assert!(product.price.is_none());
        assert_eq!(product.currency, "GBP");
        assert!(product.description.is_none());
    }

    #[test]
    fn sku_match_ignores_fuzzy_hits() {
        let fuzzy = Product {
            id: "gid://shopify/Product/1".to_string(),
            name: "Mug".to_string(),
            sku: Some("MUG-0410".to_string()),
            price: None,
            currency: "GBP".to_string(),
            url: None,
            in_stock: true,
            description: None,
        };
        let exact = Product {
            sku: Some("MUG-041".to_string()),
            ..fuzzy.clone()
        };

        let found = exact_sku_match(vec![fuzzy.clone(), exact], "mug-041").unwrap();
        assert_eq!(found.sku.as_deref(), Some("MUG-041"));
        assert!(exact_sku_match(vec![fuzzy], "MUG-041").is_none());
    }

    #[test]
    fn graphql_errors_join_into_one_message() {
        let raw = r#"{"errors": [{"message": "throttled"}, {"message": "try later"}]}"#;
        let wire: GraphQlResponse = serde_json::from_str(raw).unwrap();
        assert!(wire.data.is_none());
        assert_eq!(graphql_error_message(wire.errors), "throttled; try later");
    }

    #[tokio::test]
    async fn order_lookup_is_unsupported() {
        let provider = ShopifyProvider::new(&shopify_config(), SecretString::from("tok"));
        let err = provider.order_status("1002").await.unwrap_err();
        assert!(matches!(err, CommerceError::Unsupported(_)));
    }

    #[tokio::test]
    async fn detector_passes_on_unconfigured_tenant() {
        let tenant = TenantConfig::new("bare.example.com");
        assert!(ShopifyDetector.detect(&tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn detector_yields_client_when_token_resolves() {
        // SAFETY: unique var name, set and removed within this test.
        unsafe { std::env::set_var("PATTER_TEST_SF_TOKEN_B", "shpat_test") };

        let mut tenant = TenantConfig::new("gifts.example.com");
        tenant.integrations.shopify = Some(ShopifyConfig {
            shop_domain: "gifts-example.myshopify.com".to_string(),
            access_token_env: "PATTER_TEST_SF_TOKEN_B".to_string(),
            api_version: "2024-07".to_string(),
        });

        let found = ShopifyDetector.detect(&tenant).await.unwrap().unwrap();
        assert_eq!(found.platform(), CommercePlatform::Shopify);

        // SAFETY: removing the var this test set above.
        unsafe { std::env::remove_var("PATTER_TEST_SF_TOKEN_B") };
    }

    #[tokio::test]
    async fn detector_reports_missing_token() {
        let mut tenant = TenantConfig::new("gifts.example.com");
        tenant.integrations.shopify = Some(shopify_config());

        let err = ShopifyDetector.detect(&tenant).await.unwrap_err();
        assert!(matches!(err, ResolveError::MissingCredentials(_)));
    }
}
