//! Tool variants, argument schemas, and the per-tenant registry.

use patter_types::llm::ToolDefinition;
use patter_types::tenant::TenantConfig;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Arguments for `search_products`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchProductsArgs {
    /// Free-text product query, or an exact SKU.
    pub query: String,
    /// Maximum number of results.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Arguments for `get_product_details`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetProductDetailsArgs {
    /// Product SKU or identifier from an earlier search result.
    pub product_ref: String,
}

/// Arguments for `check_order_status`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckOrderStatusArgs {
    /// Order number or reference the customer was given.
    pub order_ref: String,
}

/// The closed set of tools the engine can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SearchProducts,
    GetProductDetails,
    CheckOrderStatus,
}

impl ToolKind {
    /// Wire name the model calls the tool by.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SearchProducts => "search_products",
            ToolKind::GetProductDetails => "get_product_details",
            ToolKind::CheckOrderStatus => "check_order_status",
        }
    }

    /// Reverse of [`ToolKind::name`].
    pub fn from_name(name: &str) -> Option<ToolKind> {
        match name {
            "search_products" => Some(ToolKind::SearchProducts),
            "get_product_details" => Some(ToolKind::GetProductDetails),
            "check_order_status" => Some(ToolKind::CheckOrderStatus),
            _ => None,
        }
    }

    /// Definition handed to the model, with the derived argument schema.
    pub fn definition(&self) -> ToolDefinition {
        let (description, parameters) = match self {
            ToolKind::SearchProducts => (
                "Search the store for products matching a query. Reports \
                 ranked results, or why nothing could be found.",
                schema_of::<SearchProductsArgs>(),
            ),
            ToolKind::GetProductDetails => (
                "Fetch full details for one product by SKU or id.",
                schema_of::<GetProductDetailsArgs>(),
            ),
            ToolKind::CheckOrderStatus => (
                "Look up the status of a customer's order by its reference.",
                schema_of::<CheckOrderStatusArgs>(),
            ),
        };
        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Generate the JSON schema for an argument struct with
/// `additionalProperties: false` applied throughout.
fn schema_of<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value =
        serde_json::to_value(schema).expect("argument schema serialization should not fail");
    deny_additional_properties(&mut value);
    value
}

/// Recursively set `additionalProperties: false` on every object schema.
fn deny_additional_properties(value: &mut Value) {
    if let Value::Object(map) = value {
        if map.get("type").and_then(Value::as_str) == Some("object") {
            map.entry("additionalProperties").or_insert(Value::Bool(false));
        }
        for nested in map.values_mut() {
            deny_additional_properties(nested);
        }
    }
}

/// The capability subset one tenant's configuration supports.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Build the registry for a tenant.
    ///
    /// Product search and details are always available; the semantic stage
    /// works even with no commerce integration. Order lookup needs a
    /// platform with order API access.
    pub fn for_tenant(tenant: &TenantConfig) -> Self {
        let mut tools = vec![ToolKind::SearchProducts, ToolKind::GetProductDetails];
        if tenant.order_lookup_configured() {
            tools.push(ToolKind::CheckOrderStatus);
        }
        Self { tools }
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools.contains(&kind)
    }

    pub fn kinds(&self) -> &[ToolKind] {
        &self.tools
    }

    /// Definitions for every tool in this registry, for the model request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolKind::definition).collect()
    }
}
