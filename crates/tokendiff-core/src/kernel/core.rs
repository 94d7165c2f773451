//! Kernel core structure

use std::sync::Arc;
use tokendiff_llm::LlmProvider;
use tokendiff_tools::ToolRunner;

/// Binds a model provider to the tools it may call
pub struct Kernel {
    pub(crate) provider: Arc<dyn LlmProvider>,
    pub(crate) runner: ToolRunner,
    pub(crate) system_prompt: Option<String>,
}

impl Kernel {
    /// Create a new kernel
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, runner: ToolRunner) -> Self {
        Self {
            provider,
            runner,
            system_prompt: None,
        }
    }

    /// Prepend a system message to every prompt
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// The model provider
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// The tool runner
    #[must_use]
    pub fn runner(&self) -> &ToolRunner {
        &self.runner
    }
}
