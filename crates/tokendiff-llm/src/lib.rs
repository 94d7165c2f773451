//! TokenDiff LLM - Chat completion and usage interception
//!
//! This crate provides the LLM side of TokenDiff:
//! - Transport: buffered HTTP request/response boundary over reqwest
//! - Intercept: passthrough transport decorator that records token usage
//! - Metrics: shared, append-only store of per-call usage records
//! - Rate limit: `x-ratelimit-*` header parsing with an observation hook
//! - OpenAI: chat-completions provider for OpenAI and Azure OpenAI
//! - Mock: scripted provider for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod intercept;
pub mod message;
pub mod metrics;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod ratelimit;
pub mod tools;
pub mod transport;
pub mod util;

pub use completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
pub use error::{Error, Result};
pub use intercept::UsageInterceptor;
pub use message::{Message, MessageRole};
pub use metrics::{UsageMetrics, UsageRecord, UsageSummary};
pub use mock::MockProvider;
pub use openai::{ApiFlavor, OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
pub use ratelimit::{RateLimitHook, RateLimitSnapshot, RateLimitTracker};
pub use tools::{ToolCall, ToolDefinition};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
