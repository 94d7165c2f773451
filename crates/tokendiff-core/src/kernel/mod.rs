//! Kernel - prompt invocation with automatic tool calls
//!
//! # Module Structure
//!
//! - `config`: per-call settings (`PromptSettings`, `ToolCallBehavior`)
//! - `types`: results and metadata
//! - `core`: the `Kernel` struct
//! - `invoke`: the model/tool loop
//! - `tool_execution`: running the tool calls of one model turn

mod config;
mod core;
mod invoke;
mod tool_execution;
mod types;


pub use config::{PromptSettings, ToolCallBehavior};
pub use self::core::Kernel;
pub use types::{ChatTokenUsage, PromptMetadata, PromptResult, ToolInvocation};
