//! OpenAI - chat-completions provider over an [`HttpTransport`]
//!
//! Speaks the chat-completions wire format to either the public OpenAI API
//! or an Azure OpenAI deployment. All traffic goes through the injected
//! transport so it can be decorated (see [`crate::intercept`]).

use crate::completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::provider::LlmProvider;
use crate::tools::{ToolCall, ToolDefinition};
use crate::transport::{HttpRequest, HttpTransport};
use crate::util::{mask_api_key, sanitize_api_error};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Default public API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for the public API
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default Azure OpenAI REST API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

/// Which flavour of the chat-completions API to call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `POST {endpoint}/chat/completions` with a bearer token
    OpenAi,
    /// `POST {endpoint}/openai/deployments/{deployment}/chat/completions`
    /// with an `api-key` header
    Azure {
        /// `api-version` query parameter
        api_version: String,
    },
}

/// Configuration for the OpenAI provider
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL (OpenAI) or resource endpoint (Azure)
    pub endpoint: String,
    /// API flavour
    pub flavor: ApiFlavor,
    /// Model name (OpenAI) or deployment name (Azure)
    pub default_model: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("flavor", &self.flavor)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Configuration for the public OpenAI API
    #[must_use]
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_BASE_URL.to_string(),
            flavor: ApiFlavor::OpenAi,
            default_model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Configuration for an Azure OpenAI deployment
    #[must_use]
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            flavor: ApiFlavor::Azure {
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
            default_model: deployment.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the endpoint / base URL
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the Azure `api-version` (ignored for the public API)
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        if let ApiFlavor::Azure { api_version } = &mut self.flavor {
            *api_version = version.into();
        }
        self
    }

    /// Sets the default model / deployment
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Chat-completions URL for `model`
    #[must_use]
    pub fn chat_url(&self, model: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match &self.flavor {
            ApiFlavor::OpenAi => format!("{}/chat/completions", base),
            ApiFlavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base, model, api_version
            ),
        }
    }
}

/// Chat-completions provider
pub struct OpenAiProvider {
    transport: Arc<dyn HttpTransport>,
    config: OpenAiConfig,
    cancel: CancellationToken,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Serialize)]
struct ChatTool {
    r#type: &'static str,
    function: ChatFunction,
}

#[derive(Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiProvider {
    /// Create a provider that sends through `transport`
    #[must_use]
    pub fn new(config: OpenAiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel in-flight requests when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Provider configuration
    #[must_use]
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn convert_message(msg: &Message) -> ChatMessage {
        let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
            msg.tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    r#type: function_type(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect()
        });

        // Assistant turns that only carry tool calls send `content: null`
        let content = if msg.role == MessageRole::Assistant
            && tool_calls.is_some()
            && msg.content.is_empty()
        {
            None
        } else {
            Some(msg.content.clone())
        };

        ChatMessage {
            role: msg.role.as_str(),
            content,
            tool_call_id: msg.tool_call_id.clone(),
            // Tool results are matched by `tool_call_id`; `name` is not accepted there
            name: (msg.role != MessageRole::Tool)
                .then(|| msg.name.clone())
                .flatten(),
            tool_calls,
        }
    }

    fn convert_tool(tool: &ToolDefinition) -> ChatTool {
        ChatTool {
            r#type: "function",
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }

    async fn send_chat(&self, request: &ToolCompletionRequest) -> Result<ToolCompletionResponse> {
        let model = if request.request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.request.model.as_str()
        };

        let tools = (!request.tools.is_empty())
            .then(|| request.tools.iter().map(Self::convert_tool).collect::<Vec<_>>());
        let tool_choice = tools.as_ref().map(|_| "auto");

        let body = ChatRequest {
            // Azure routes by deployment in the URL
            model: matches!(self.config.flavor, ApiFlavor::OpenAi).then_some(model),
            messages: request
                .request
                .messages
                .iter()
                .map(Self::convert_message)
                .collect(),
            max_tokens: request.request.max_tokens,
            temperature: request.request.temperature,
            tools,
            tool_choice,
            stream: false,
        };

        let http_request = HttpRequest::post_json(self.config.chat_url(model), &body)?;
        let http_request = match self.config.flavor {
            ApiFlavor::OpenAi => http_request
                .with_header("authorization", &format!("Bearer {}", self.config.api_key))?,
            ApiFlavor::Azure { .. } => http_request.with_header("api-key", &self.config.api_key)?,
        };

        debug!(messages = request.request.messages.len(), "Sending chat request");

        let response = self.transport.send(http_request, &self.cancel).await?;

        if response.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit);
        }
        if !response.is_success() {
            return Err(Error::Api(sanitize_api_error(&response.text())));
        }

        let chat: ChatResponse = response.json()?;
        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter(|tc| tc.r#type == "function")
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ToolCompletionResponse {
            content: choice.message.content,
            tool_calls,
            usage: chat.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
            model: chat.model,
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        match self.config.flavor {
            ApiFlavor::OpenAi => "openai",
            ApiFlavor::Azure { .. } => "azure-openai",
        }
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = self
            .send_chat(&ToolCompletionRequest::new(request, Vec::new()))
            .await?;

        Ok(CompletionResponse {
            content: response.content.unwrap_or_default(),
            usage: response.usage,
            finish_reason: response.finish_reason,
            model: response.model,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.request.model, tools = request.tools.len()))]
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse> {
        self.send_chat(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::openai("test-key")
            .with_model("gpt-4o")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.flavor, ApiFlavor::OpenAi);
    }

    #[test]
    fn test_chat_urls() {
        let openai = OpenAiConfig::openai("k");
        assert_eq!(
            openai.chat_url("gpt-4o"),
            "https://api.openai.com/v1/chat/completions"
        );

        let azure = OpenAiConfig::azure("https://res.openai.azure.com/", "gpt4o-deploy", "k")
            .with_api_version("2024-06-01");
        assert_eq!(
            azure.chat_url("gpt4o-deploy"),
            "https://res.openai.azure.com/openai/deployments/gpt4o-deploy/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn test_api_version_ignored_for_openai() {
        let config = OpenAiConfig::openai("k").with_api_version("2024-06-01");
        assert_eq!(config.flavor, ApiFlavor::OpenAi);
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = OpenAiConfig::openai("sk-1234567890abcdefghijklmnop");
        let debug_str = format!("{:?}", config);

        assert!(!debug_str.contains("1234567890abcdefghijkl"));
        assert!(debug_str.contains("sk-1...mnop"));
    }

    #[test]
    fn test_convert_assistant_tool_call_message() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "change_state".to_string(),
                arguments: r#"{"id":1,"is_on":true}"#.to_string(),
            }],
        );
        let wire = serde_json::to_value(OpenAiProvider::convert_message(&msg)).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "change_state");
    }

    #[test]
    fn test_convert_tool_message() {
        let msg = Message::tool_response("call_1", "get_lights", "[]");
        let wire = serde_json::to_value(OpenAiProvider::convert_message(&msg)).unwrap();
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_1");
        assert_eq!(wire["content"], "[]");
        assert!(wire.get("tool_calls").is_none());
        assert!(wire.get("name").is_none());
    }
}
