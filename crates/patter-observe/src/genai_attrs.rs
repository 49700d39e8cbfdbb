//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! These follow the OTel GenAI Semantic Conventions specification for
//! consistent instrumentation of model calls and tool executions across the
//! codebase. All constants are string slices matching the field names used
//! in `tracing::info_span!` instrumentation.
//!
//! Span naming convention: `"{operation} {model}"` (e.g., `"chat gpt-4o-mini"`)

// --- Required attributes ---

/// The name of the operation being performed (e.g., "chat", "execute_tool").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "openai_compat").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

/// The model ID requested (e.g., "gpt-4o-mini").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The sampling temperature for the request.
pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reasons for the response (e.g., "end_turn", "tool_use").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// The unique response/message ID from the provider.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

// --- Conversation and tool attributes ---

/// The conversation this span belongs to.
pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

/// The name of the tool being executed.
pub const GEN_AI_TOOL_NAME: &str = "gen_ai.tool.name";

/// The model-assigned id of the tool call being executed.
pub const GEN_AI_TOOL_CALL_ID: &str = "gen_ai.tool.call.id";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

/// Tool execution requested by the model.
pub const OP_EXECUTE_TOOL: &str = "execute_tool";

// --- Provider name values ---

/// OpenAI-compatible chat-completions provider identifier.
pub const PROVIDER_OPENAI_COMPAT: &str = "openai_compat";
