//! OpenAI chat-completions wire types.
//!
//! These are the request/response structures exchanged over HTTP with an
//! OpenAI-compatible endpoint. They are NOT the generic model types from
//! patter-types -- those are vendor-neutral; the mapping between the two
//! lives in the client.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ChatTool>,
    /// Only sent when tools are present; some gateways reject it otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

/// A single message in the chat-completions window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    /// Null for assistant messages that carry only tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ChatToolCall>,
    /// For tool-role messages: which call this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A tool surfaced to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTool {
    /// Always "function".
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ChatFunction,
}

/// Function definition inside a tool entry.
#[derive(Debug, Clone, Serialize)]
pub struct ChatFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A tool call requested by the model.
///
/// `function.arguments` is a JSON document encoded as a string, per the
/// chat-completions wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ChatFunctionCall,
}

/// The function invocation inside a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Response body from `POST /chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

/// One completion choice; the engine only ever reads the first.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting in the chat-completions dialect.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_empty_tool_fields() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some("hello".to_string()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            }],
            max_tokens: 64,
            temperature: None,
            tools: Vec::new(),
            tool_choice: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("tools"));
        assert!(!json.contains("tool_choice"));
        assert!(!json.contains("temperature"));
        assert!(!json.contains("tool_calls"));
    }

    #[test]
    fn tool_entry_serializes_with_function_tag() {
        let tool = ChatTool {
            kind: "function".to_string(),
            function: ChatFunction {
                name: "search_products".to_string(),
                description: "Search the catalog".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            },
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("\"type\":\"function\""));
        assert!(json.contains("\"name\":\"search_products\""));
    }

    #[test]
    fn response_parses_tool_call_with_string_arguments() {
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
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        let choice = &response.choices[0];
        assert!(choice.message.content.is_none());
        assert_eq!(choice.message.tool_calls.len(), 1);
        assert_eq!(choice.message.tool_calls[0].function.name, "search_products");
        assert_eq!(choice.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(response.usage.unwrap().prompt_tokens, 12);
    }

    #[test]
    fn response_without_usage_still_parses() {
        let raw = r#"{
            "id": "chatcmpl-2",
            "model": "local",
            "choices": [{"message": {"role": "assistant", "content": "hi"}}]
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(response.usage.is_none());
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hi"));
        assert!(response.choices[0].finish_reason.is_none());
    }
}
