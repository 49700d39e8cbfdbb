//! Commerce data types for Patter.
//!
//! Platform-neutral shapes for products and orders as returned by a
//! tenant's commerce backend, plus currency display helpers used when
//! synthesizing responses that mention prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// E-commerce platform backing a tenant's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommercePlatform {
    WooCommerce,
    Shopify,
}

impl fmt::Display for CommercePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommercePlatform::WooCommerce => write!(f, "woocommerce"),
            CommercePlatform::Shopify => write!(f, "shopify"),
        }
    }
}

impl FromStr for CommercePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "woocommerce" => Ok(CommercePlatform::WooCommerce),
            "shopify" => Ok(CommercePlatform::Shopify),
            other => Err(format!("invalid commerce platform: '{other}'")),
        }
    }
}

/// A product as returned by a commerce provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Price formatted with its currency symbol, e.g. "£24.99".
    pub fn display_price(&self) -> Option<String> {
        self.price
            .map(|p| format!("{}{:.2}", currency_symbol(&self.currency), p))
    }
}

/// Status summary for an order lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_ref: String,
    /// Platform status string ("processing", "completed", ...).
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "GBP".to_string()
}

/// Display symbol for an ISO 4217 currency code.
///
/// Unknown codes fall back to the uppercased code followed by a space, so a
/// formatted amount still reads sensibly ("SEK 120.00").
pub fn currency_symbol(code: &str) -> String {
    match code.to_uppercase().as_str() {
        "GBP" => "£".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "JPY" | "CNY" => "¥".to_string(),
        "AUD" => "A$".to_string(),
        "CAD" => "C$".to_string(),
        "NZD" => "NZ$".to_string(),
        "INR" => "₹".to_string(),
        "KRW" => "₩".to_string(),
        other => format!("{other} "),
    }
}
