//! TokenDiff Tools - Tool Registry and Execution Engine
//!
//! This crate provides the functions a model may call:
//! - Registry: tool registration and discovery
//! - Runner: tool execution with timeouts
//! - Builtins: the mock smart-home lights plugin

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod registry;
pub mod runner;

pub use builtins::{register_lights, LightState, LightStore, LightUpdate};
pub use error::{Error, Result};
pub use registry::{Tool, ToolDefinition, ToolRegistry, ToolResult};
pub use runner::{ExecutionResult, RunnerConfig, ToolRunner};
