//! OpenAiCompatClient -- concrete [`ModelClient`] over the chat-completions API.
//!
//! Sends requests to `{base_url}/chat/completions` with bearer
//! authentication and maps between the vendor-neutral types in
//! patter-types and the wire dialect in [`types`].
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.
//!
//! [`ModelClient`]: patter_core::llm::client::ModelClient

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use patter_core::llm::client::ModelClient;
use patter_types::error::ModelError;
use patter_types::llm::{
    CompletionRequest, CompletionResponse, ModelMessage, StopReason, ToolCallRequest,
    ToolDefinition, Usage,
};

use self::types::{
    ChatFunction, ChatFunctionCall, ChatMessage, ChatRequest, ChatResponse, ChatTool,
    ChatToolCall,
};

/// OpenAI-compatible chat-completions client.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing the authorization header. It never appears in Debug
/// output, Display output, or tracing logs.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiCompatClient {
    /// Create a client pointed at the OpenAI endpoint.
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Override the base URL (self-hosted gateways, tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// OpenAiCompatClient intentionally does NOT derive Debug so the key-holding
// struct can never be printed wholesale.

impl ModelClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let body = to_wire_request(request);
        let url = self.url("/chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => ModelError::AuthenticationFailed,
                429 => ModelError::RateLimited { retry_after_ms },
                400 => ModelError::InvalidRequest(error_body),
                500..=599 => ModelError::Overloaded(error_body),
                code => ModelError::Api {
                    status: code,
                    message: error_body,
                },
            });
        }

        let wire: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Deserialization(format!("failed to parse response: {e}")))?;

        from_wire_response(wire)
    }
}

/// Convert a vendor-neutral [`CompletionRequest`] into the wire request.
fn to_wire_request(request: &CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    // The chat-completions dialect carries the system prompt as the first
    // message rather than a dedicated field.
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: Some(system.clone()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        });
    }
    messages.extend(request.messages.iter().map(to_wire_message));

    let tools: Vec<ChatTool> = request.tools.iter().map(to_wire_tool).collect();
    let tool_choice = if tools.is_empty() {
        None
    } else {
        Some(request.tool_choice.to_string())
    };

    ChatRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools,
        tool_choice,
    }
}

fn to_wire_message(message: &ModelMessage) -> ChatMessage {
    let tool_calls = message
        .tool_calls
        .iter()
        .map(|call| ChatToolCall {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: ChatFunctionCall {
                name: call.name.clone(),
                // Arguments travel as a JSON document encoded into a string.
                arguments: call.arguments.to_string(),
            },
        })
        .collect();

    ChatMessage {
        role: message.role.to_string(),
        content: (!message.content.is_empty()).then(|| message.content.clone()),
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn to_wire_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        kind: "function".to_string(),
        function: ChatFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

/// Convert a wire response into a vendor-neutral [`CompletionResponse`].
fn from_wire_response(wire: ChatResponse) -> Result<CompletionResponse, ModelError> {
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::Deserialization("response carried no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = match serde_json::from_str(&call.function.arguments) {
                Ok(value) => value,
                // Malformed arguments surface as a per-tool failure
                // downstream rather than aborting the whole turn here.
                Err(_) => serde_json::Value::String(call.function.arguments),
            };
            ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments,
            }
        })
        .collect();

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("tool_calls") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    };

    let usage = wire
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: wire.id,
        content: choice.message.content.unwrap_or_default(),
        model: wire.model,
        tool_calls,
        stop_reason,
        usage,
    })
}

/// Parse a `Retry-After` header (whole seconds) into milliseconds.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let secs: u64 = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(secs * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patter_types::llm::ToolChoice;
    use serde_json::json;

    fn make_client() -> OpenAiCompatClient {
        OpenAiCompatClient::new(SecretString::from("test-key-not-real"))
    }

    fn request_with(messages: Vec<ModelMessage>, tools: Vec<ToolDefinition>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages,
            system: Some("You are a shopping assistant.".to_string()),
            max_tokens: 1024,
            temperature: Some(0.2),
            tools,
            tool_choice: ToolChoice::Auto,
        }
    }

    #[test]
    fn client_name() {
        assert_eq!(make_client().name(), "openai_compat");
    }

    #[test]
    fn base_url_override_trims_trailing_slash() {
        let client = make_client().with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            client.url("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn system_prompt_becomes_first_message() {
        let request = request_with(vec![ModelMessage::user("show me mugs")], Vec::new());
        let wire = to_wire_request(&request);
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(
            wire.messages[0].content.as_deref(),
            Some("You are a shopping assistant.")
        );
        assert_eq!(wire.messages[1].role, "user");
        assert!(wire.tool_choice.is_none());
    }

    #[test]
    fn tool_calls_encode_arguments_as_strings() {
        let assistant = ModelMessage::assistant_with_tools(
            "",
            vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "search_products".to_string(),
                arguments: json!({"query": "mug"}),
            }],
        );
        let result = ModelMessage::tool_result("call_1", "{\"count\":3}");
        let request = request_with(
            vec![ModelMessage::user("mugs?"), assistant, result],
            vec![ToolDefinition {
                name: "search_products".to_string(),
                description: "Search the catalog".to_string(),
                parameters: json!({"type": "object"}),
            }],
        );

        let wire = to_wire_request(&request);
        // system + user + assistant + tool
        assert_eq!(wire.messages.len(), 4);

        let assistant_wire = &wire.messages[2];
        assert_eq!(assistant_wire.role, "assistant");
        assert!(assistant_wire.content.is_none());
        assert_eq!(assistant_wire.tool_calls[0].kind, "function");
        assert_eq!(
            assistant_wire.tool_calls[0].function.arguments,
            "{\"query\":\"mug\"}"
        );

        let tool_wire = &wire.messages[3];
        assert_eq!(tool_wire.role, "tool");
        assert_eq!(tool_wire.tool_call_id.as_deref(), Some("call_1"));

        assert_eq!(wire.tools.len(), 1);
        assert_eq!(wire.tool_choice.as_deref(), Some("auto"));
    }

    #[test]
    fn wire_response_converts_to_completion() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "search_products", "arguments": "{\"query\":\"mug\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 40, "completion_tokens": 9}
        }"#;
        let wire: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = from_wire_response(wire).unwrap();

        assert!(response.wants_tools());
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.tool_calls[0].arguments, json!({"query": "mug"}));
        assert_eq!(response.usage.input_tokens, 40);
        assert_eq!(response.usage.output_tokens, 9);
        assert!(response.content.is_empty());
    }

    #[test]
    fn malformed_arguments_fall_back_to_raw_string() {
        let raw = r#"{
            "id": "chatcmpl-3",
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "search_products", "arguments": "{not json"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let wire: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = from_wire_response(wire).unwrap();
        assert_eq!(
            response.tool_calls[0].arguments,
            serde_json::Value::String("{not json".to_string())
        );
    }

    #[test]
    fn empty_choices_is_a_deserialization_error() {
        let wire: ChatResponse =
            serde_json::from_str(r#"{"id": "x", "model": "m", "choices": []}"#).unwrap();
        let err = from_wire_response(wire).unwrap_err();
        assert!(matches!(err, ModelError::Deserialization(_)));
    }

    #[test]
    fn retry_after_header_parses_to_millis() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(retry_after_ms(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, "2".parse().unwrap());
        assert_eq!(retry_after_ms(&headers), Some(2000));

        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(retry_after_ms(&headers), None);
    }
}
