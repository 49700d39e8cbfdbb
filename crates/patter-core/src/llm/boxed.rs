//! BoxModelClient -- object-safe dynamic dispatch wrapper for ModelClient.
//!
//! The blanket-impl pattern:
//! 1. Define an object-safe `ModelClientDyn` trait with boxed futures
//! 2. Blanket-impl `ModelClientDyn` for all `T: ModelClient`
//! 3. `BoxModelClient` wraps `Box<dyn ModelClientDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use patter_types::error::ModelError;
use patter_types::llm::{CompletionRequest, CompletionResponse};

use super::client::ModelClient;

/// Object-safe version of [`ModelClient`] with boxed futures.
///
/// Exists solely to enable dynamic dispatch (`dyn ModelClientDyn`). A blanket
/// implementation is provided for all types implementing `ModelClient`.
pub trait ModelClientDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, ModelError>> + Send + 'a>>;
}

/// Blanket implementation: any `ModelClient` automatically implements `ModelClientDyn`.
impl<T: ModelClient> ModelClientDyn for T {
    fn name(&self) -> &str {
        ModelClient::name(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, ModelError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased model client for runtime backend selection.
///
/// Since `ModelClient` uses RPITIT it cannot be a trait object directly;
/// `BoxModelClient` provides equivalent methods that delegate to the inner
/// `ModelClientDyn` trait object.
pub struct BoxModelClient {
    inner: Box<dyn ModelClientDyn + Send + Sync>,
}

impl BoxModelClient {
    /// Wrap a concrete `ModelClient` in a type-erased box.
    pub fn new<T: ModelClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }

    /// Backend name for telemetry.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a completion request and receive the full response.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        self.inner.complete_boxed(request).await
    }
}
