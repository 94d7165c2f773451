//! Kernel result types

use serde::{Deserialize, Serialize};
use tokendiff_llm::{TokenUsage, ToolCompletionResponse};

/// Token usage as reported in one model response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTokenUsage {
    /// Prompt tokens
    pub input_token_count: u32,
    /// Completion tokens
    pub output_token_count: u32,
    /// Total tokens
    pub total_token_count: u32,
}

impl From<TokenUsage> for ChatTokenUsage {
    fn from(usage: TokenUsage) -> Self {
        Self {
            input_token_count: usage.prompt_tokens,
            output_token_count: usage.completion_tokens,
            total_token_count: usage.total_tokens,
        }
    }
}

/// One tool call made on the model's behalf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Id the model gave the call
    pub tool_call_id: String,
    /// Tool name
    pub tool_name: String,
    /// Parsed arguments
    pub arguments: serde_json::Value,
    /// Content sent back to the model
    pub output: serde_json::Value,
    /// Whether the tool succeeded
    pub success: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Metadata attached to a prompt result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptMetadata {
    /// Usage of the last model response only
    pub usage: Option<ChatTokenUsage>,
    /// Model that produced the last response
    pub model: String,
    /// Finish reason of the last response
    pub finish_reason: Option<String>,
    /// Model round trips made
    pub iterations: usize,
    /// Tool calls executed, in order
    pub tool_invocations: Vec<ToolInvocation>,
}

impl PromptMetadata {
    pub(crate) fn from_response(
        response: &ToolCompletionResponse,
        iterations: usize,
        tool_invocations: Vec<ToolInvocation>,
    ) -> Self {
        Self {
            usage: response.usage.map(ChatTokenUsage::from),
            model: response.model.clone(),
            finish_reason: response.finish_reason.clone(),
            iterations,
            tool_invocations,
        }
    }
}

/// Final answer of `invoke_prompt`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResult {
    /// Model text
    pub text: String,
    /// Response metadata
    pub metadata: PromptMetadata,
}
