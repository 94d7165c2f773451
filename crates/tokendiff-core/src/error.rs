//! Error types for tokendiff-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] tokendiff_llm::Error),

    /// Tool error
    #[error("tool error: {0}")]
    Tool(#[from] tokendiff_tools::Error),

    /// The model kept asking for tools
    #[error("no final answer after {0} iterations")]
    MaxIterations(usize),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
