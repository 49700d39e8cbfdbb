//! Dispatches one tool call against the search and commerce layers.

use std::sync::Arc;

use patter_types::error::{CommerceError, ToolError};
use patter_types::llm::ToolCallRequest;
use patter_types::tenant::TenantConfig;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::commerce::resolver::ProviderResolver;
use crate::search::orchestrator::SearchOrchestrator;

use super::registry::{
    CheckOrderStatusArgs, GetProductDetailsArgs, SearchProductsArgs, ToolKind, ToolRegistry,
};

/// Executes tool calls on behalf of the reasoning loop.
///
/// Failures come back as [`ToolError`] so the runner can convert them into
/// typed outcomes for the model; nothing here aborts a turn.
pub struct ToolExecutor {
    search: Arc<SearchOrchestrator>,
    resolver: Arc<ProviderResolver>,
}

impl ToolExecutor {
    pub fn new(search: Arc<SearchOrchestrator>, resolver: Arc<ProviderResolver>) -> Self {
        Self { search, resolver }
    }

    /// Run one tool call for a tenant.
    ///
    /// The registry gates access: a tool the tenant is not entitled to is
    /// indistinguishable from one that does not exist.
    pub async fn execute(
        &self,
        tenant: &TenantConfig,
        registry: &ToolRegistry,
        call: &ToolCallRequest,
    ) -> Result<Value, ToolError> {
        let kind = ToolKind::from_name(&call.name)
            .filter(|kind| registry.contains(*kind))
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        debug!(tool = call.name.as_str(), call_id = call.id.as_str(), "executing tool call");

        match kind {
            ToolKind::SearchProducts => {
                let args: SearchProductsArgs = parse_args(call)?;
                let report = self.search.dispatch(tenant, &args.query, args.limit).await;
                to_result(&call.name, &report)
            }
            ToolKind::GetProductDetails => {
                let args: GetProductDetailsArgs = parse_args(call)?;
                let report = self.search.product_by_ref(tenant, &args.product_ref).await;
                to_result(&call.name, &report)
            }
            ToolKind::CheckOrderStatus => {
                let args: CheckOrderStatusArgs = parse_args(call)?;
                self.check_order(tenant, &args.order_ref).await
            }
        }
    }

    /// Order lookup. An unreachable backend is an error, never "order not
    /// found": the distinction decides what the model may claim.
    async fn check_order(&self, tenant: &TenantConfig, order_ref: &str) -> Result<Value, ToolError> {
        let handle = self.resolver.resolve(tenant).await.ok_or_else(|| {
            ToolError::Execution("order system unreachable for this store".to_string())
        })?;
        match handle.client.order_status(order_ref).await {
            Ok(Some(status)) => to_result("check_order_status", &status),
            Ok(None) => Ok(json!({ "order_ref": order_ref, "found": false })),
            Err(CommerceError::Unsupported(op)) => Err(ToolError::Execution(format!(
                "platform does not support {op}"
            ))),
            Err(err) => Err(ToolError::Execution(err.to_string())),
        }
    }
}

fn parse_args<T: DeserializeOwned>(call: &ToolCallRequest) -> Result<T, ToolError> {
    serde_json::from_value(call.arguments.clone()).map_err(|err| ToolError::InvalidArguments {
        name: call.name.clone(),
        reason: err.to_string(),
    })
}

fn to_result<T: serde::Serialize>(tool: &str, value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|err| ToolError::Execution(format!("{tool} result serialization: {err}")))
}
