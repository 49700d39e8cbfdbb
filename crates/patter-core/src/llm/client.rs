//! ModelClient trait definition.
//!
//! The single abstraction the reasoning loop uses to reach a model backend.
//! Uses RPITIT; `BoxModelClient` provides the object-safe form.

use patter_types::error::ModelError;
use patter_types::llm::{CompletionRequest, CompletionResponse};

/// Trait for model backends (OpenAI-compatible HTTP, test stubs, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The loop
/// decides retry behavior from `ModelError::is_transient`; implementations
/// classify failures but never retry internally.
pub trait ModelClient: Send + Sync {
    /// Backend name for telemetry (e.g. "openai_compat").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, ModelError>> + Send;
}
