//! WooCommerce REST v3 provider and detector.
//!
//! Talks to `/wp-json/wc/v3` with consumer key/secret query authentication.
//! Products and orders come back in WooCommerce's own wire shapes (prices as
//! strings, GMT timestamps without offsets); this module maps them onto the
//! neutral commerce types.
//!
//! Credentials are wrapped in [`secrecy::SecretString`] and exposed only
//! while building the request query.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use patter_core::commerce::boxed::BoxCommerceProvider;
use patter_core::commerce::provider::CommerceProvider;
use patter_core::commerce::resolver::ProviderDetector;
use patter_types::commerce::{CommercePlatform, OrderStatus, Product};
use patter_types::error::{CommerceError, ResolveError};
use patter_types::tenant::{TenantConfig, WooCommerceConfig};

use super::read_credential;

/// WooCommerce store client over the REST v3 API.
pub struct WooCommerceProvider {
    client: reqwest::Client,
    store_url: String,
    consumer_key: SecretString,
    consumer_secret: SecretString,
}

impl WooCommerceProvider {
    /// REST namespace appended to the store URL.
    const API_BASE: &'static str = "/wp-json/wc/v3";

    pub fn new(
        store_url: impl Into<String>,
        consumer_key: SecretString,
        consumer_secret: SecretString,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            store_url: store_url.into().trim_end_matches('/').to_string(),
            consumer_key,
            consumer_secret,
        }
    }

    /// Build a client from tenant config, resolving credentials from the
    /// environment variables the config names.
    pub fn from_config(config: &WooCommerceConfig) -> Result<Self, ResolveError> {
        let consumer_key = read_credential(&config.consumer_key_env)?;
        let consumer_secret = read_credential(&config.consumer_secret_env)?;
        Ok(Self::new(&config.store_url, consumer_key, consumer_secret))
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.store_url, Self::API_BASE, path)
    }

    /// Authenticated GET with extra query parameters.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, CommerceError> {
        self.client
            .get(url)
            .query(&[
                ("consumer_key", self.consumer_key.expose_secret()),
                ("consumer_secret", self.consumer_secret.expose_secret()),
            ])
            .query(query)
            .send()
            .await
            .map_err(|e| CommerceError::Connection(e.to_string()))
    }
}

// WooCommerceProvider intentionally does NOT derive Debug so the
// credential-holding struct can never be printed wholesale.

impl CommerceProvider for WooCommerceProvider {
    fn platform(&self) -> CommercePlatform {
        CommercePlatform::WooCommerce
    }

    async fn search_products(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Product>, CommerceError> {
        let url = self.url("/products");
        let per_page = limit.to_string();
        let response = self
            .get(&url, &[("search", query), ("per_page", per_page.as_str())])
            .await?;
        let response = check_status(response).await?;

        let rows: Vec<WcProduct> = response
            .json()
            .await
            .map_err(|e| CommerceError::Deserialization(format!("product list: {e}")))?;
        Ok(rows.into_iter().map(WcProduct::into_product).collect())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, CommerceError> {
        let url = self.url("/products");
        let response = self.get(&url, &[("sku", sku)]).await?;
        let response = check_status(response).await?;

        // The sku filter is exact; an empty list means the SKU is absent.
        let rows: Vec<WcProduct> = response
            .json()
            .await
            .map_err(|e| CommerceError::Deserialization(format!("sku lookup: {e}")))?;
        Ok(rows.into_iter().next().map(WcProduct::into_product))
    }

    async fn order_status(&self, order_ref: &str) -> Result<Option<OrderStatus>, CommerceError> {
        let reference = normalize_order_ref(order_ref);
        let url = self.url(&format!("/orders/{reference}"));
        let response = self.get(&url, &[]).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;

        let row: WcOrder = response
            .json()
            .await
            .map_err(|e| CommerceError::Deserialization(format!("order lookup: {e}")))?;
        Ok(Some(row.into_order()))
    }
}

/// Detects WooCommerce tenants.
///
/// Detection is config-driven: a tenant with WooCommerce settings whose
/// credentials resolve from the environment gets a client without a network
/// probe. Missing credentials are an error so the resolver surfaces them
/// instead of silently skipping the platform.
pub struct WooCommerceDetector;

impl ProviderDetector for WooCommerceDetector {
    fn platform(&self) -> CommercePlatform {
        CommercePlatform::WooCommerce
    }

    async fn detect(
        &self,
        tenant: &TenantConfig,
    ) -> Result<Option<BoxCommerceProvider>, ResolveError> {
        let Some(config) = &tenant.integrations.woocommerce else {
            return Ok(None);
        };
        let provider = WooCommerceProvider::from_config(config)?;
        Ok(Some(BoxCommerceProvider::new(provider)))
    }
}

// ---------------------------------------------------------------------------
// Wire rows
// ---------------------------------------------------------------------------

/// Product row as WooCommerce returns it.
#[derive(Debug, Deserialize)]
struct WcProduct {
    id: i64,
    name: String,
    #[serde(default)]
    sku: String,
    /// WooCommerce serializes prices as strings.
    #[serde(default)]
    price: String,
    #[serde(default)]
    permalink: Option<String>,
    /// "instock", "outofstock", or "onbackorder".
    #[serde(default)]
    stock_status: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
}

impl WcProduct {
    fn into_product(self) -> Product {
        Product {
            id: self.id.to_string(),
            name: self.name,
            sku: (!self.sku.is_empty()).then_some(self.sku),
            price: self.price.parse().ok(),
            // Product payloads carry no currency; the storefront default applies.
            currency: "GBP".to_string(),
            url: self.permalink,
            in_stock: self.stock_status.as_deref() != Some("outofstock"),
            description: self.short_description.filter(|d| !d.is_empty()),
        }
    }
}

/// Order row as WooCommerce returns it.
#[derive(Debug, Deserialize)]
struct WcOrder {
    id: i64,
    status: String,
    #[serde(default)]
    total: String,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    date_created_gmt: Option<String>,
}

impl WcOrder {
    fn into_order(self) -> OrderStatus {
        OrderStatus {
            order_ref: self.id.to_string(),
            status: self.status,
            total: self.total.parse().ok(),
            currency: if self.currency.is_empty() {
                "GBP".to_string()
            } else {
                self.currency
            },
            placed_at: self.date_created_gmt.as_deref().and_then(parse_gmt_datetime),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Users write order references as "#1002" or "1002"; the API wants the bare id.
fn normalize_order_ref(order_ref: &str) -> &str {
    order_ref.trim().trim_start_matches('#')
}

/// WooCommerce GMT timestamps come without an offset suffix.
fn parse_gmt_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CommerceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => CommerceError::AuthenticationFailed,
        code => CommerceError::Api {
            status: code,
            message: body,
        },
    })
}
