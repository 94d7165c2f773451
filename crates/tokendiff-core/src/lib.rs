//! TokenDiff Core - Prompt Kernel
//!
//! Runs a prompt against an [`tokendiff_llm::LlmProvider`], executes the
//! tool calls the model asks for and hands back the final text together
//! with the metadata of the last model response.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod kernel;

pub use error::{Error, Result};
pub use kernel::{
    ChatTokenUsage, Kernel, PromptMetadata, PromptResult, PromptSettings, ToolCallBehavior,
    ToolInvocation,
};
