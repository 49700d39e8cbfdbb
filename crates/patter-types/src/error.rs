use thiserror::Error;

/// Errors from model completion calls.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("model upstream overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("model API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ModelError {
    /// Whether a bounded retry with backoff is worth attempting.
    ///
    /// Connection resets, rate limits, and upstream overload are transient;
    /// auth and request-shape failures will not heal on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ModelError::Connection(_)
                | ModelError::RateLimited { .. }
                | ModelError::Overloaded(_)
        )
    }
}

/// Errors from executing a single tool call.
///
/// These are per-tool and non-fatal for the turn: the runner converts them
/// into typed failure outcomes fed back to the model, never propagating them
/// to abort the loop.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{name}' timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("unknown tool: '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("tool execution failed: {0}")]
    Execution(String),

    #[error("tool execution cancelled")]
    Cancelled,
}

/// Errors from commerce provider API calls.
#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("commerce API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Errors from commerce provider detection during resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("platform probe failed: {0}")]
    Probe(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("tenant config error: {0}")]
    TenantConfig(String),
}

/// Errors from the semantic vector index.
#[derive(Debug, Error)]
pub enum VectorSearchError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("vector search failed: {0}")]
    Search(String),
}

/// Errors from store operations (used by trait definitions in patter-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("conversation not found")]
    NotFound,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors loading engine or tenant configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading config: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("tenant '{0}' not configured")]
    TenantNotFound(String),
}

/// Fatal errors for a whole conversation turn.
///
/// Tool failures, provider outages, and iteration-cap exhaustion never reach
/// this level; they degrade the reply instead of failing the turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("model call failed after retries: {0}")]
    Model(#[from] ModelError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
