//! Completion request and response types

use crate::message::Message;
use crate::tools::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};

/// Token usage as reported by the provider for a single response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// Completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model to use (empty = provider default)
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a new completion request
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Add messages
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,
    /// Token usage
    pub usage: Option<TokenUsage>,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Model used
    pub model: String,
}

/// Request with tools
#[derive(Debug, Clone)]
pub struct ToolCompletionRequest {
    /// Base completion request
    pub request: CompletionRequest,
    /// Available tools, offered with `tool_choice: "auto"`
    pub tools: Vec<ToolDefinition>,
}

impl ToolCompletionRequest {
    /// Create a new tool completion request
    #[must_use]
    pub fn new(request: CompletionRequest, tools: Vec<ToolDefinition>) -> Self {
        Self { request, tools }
    }
}

/// Response that may include tool calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,
    /// Tool calls requested
    pub tool_calls: Vec<ToolCall>,
    /// Token usage
    pub usage: Option<TokenUsage>,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Model used
    pub model: String,
}

impl From<CompletionResponse> for ToolCompletionResponse {
    fn from(response: CompletionResponse) -> Self {
        Self {
            content: Some(response.content),
            tool_calls: Vec::new(),
            usage: response.usage,
            finish_reason: response.finish_reason,
            model: response.model,
        }
    }
}

impl ToolCompletionResponse {
    /// Check if the response has tool calls
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Build a plain-text final answer (no tool calls)
    #[must_use]
    pub fn text(content: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            usage,
            finish_reason: Some("stop".to_string()),
            model: String::new(),
        }
    }

    /// Build a response that requests tool calls
    #[must_use]
    pub fn calls(tool_calls: Vec<ToolCall>, usage: Option<TokenUsage>) -> Self {
        Self {
            content: None,
            tool_calls,
            usage,
            finish_reason: Some("tool_calls".to_string()),
            model: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("gpt-4o")
            .with_message(Message::system("You control the lights"))
            .with_message(Message::user("Please turn on the lamp"))
            .with_max_tokens(100)
            .with_temperature(0.7);

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn test_tool_completion_request() {
        let request = CompletionRequest::new("gpt-4o");
        let tools = vec![ToolDefinition::new(
            "get_lights",
            "Gets a list of lights and their current state",
            serde_json::json!({}),
        )];

        let tool_request = ToolCompletionRequest::new(request, tools);

        assert_eq!(tool_request.request.model, "gpt-4o");
        assert_eq!(tool_request.tools.len(), 1);
    }

    #[test]
    fn test_tool_completion_response_has_tool_calls() {
        let response = ToolCompletionResponse::calls(
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "get_lights".to_string(),
                arguments: "{}".to_string(),
            }],
            None,
        );
        assert!(response.has_tool_calls());
        assert_eq!(response.finish_reason.as_deref(), Some("tool_calls"));

        let final_answer = ToolCompletionResponse::text("The lamp is on.", None);
        assert!(!final_answer.has_tool_calls());
    }

    #[test]
    fn test_text_response_converts_without_tool_calls() {
        let response: ToolCompletionResponse = CompletionResponse {
            content: "Hello".to_string(),
            usage: Some(TokenUsage {
                prompt_tokens: 3,
                completion_tokens: 2,
                total_tokens: 5,
            }),
            finish_reason: Some("stop".to_string()),
            model: "gpt-4o".to_string(),
        }
        .into();

        assert_eq!(response.content.as_deref(), Some("Hello"));
        assert!(!response.has_tool_calls());
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(5));
        assert_eq!(response.model, "gpt-4o");
    }
}
