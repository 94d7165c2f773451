//! Prompt settings

/// Default cap on model round trips per prompt
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// What the kernel does with the tools in its registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolCallBehavior {
    /// Advertise no tools
    #[default]
    None,
    /// Advertise every enabled tool and run the calls the model makes
    AutoInvoke,
}

/// Options for one `invoke_prompt` call
#[derive(Debug, Clone)]
pub struct PromptSettings {
    /// Tool handling
    pub tool_call_behavior: ToolCallBehavior,
    /// Model round trips allowed before giving up
    pub max_iterations: usize,
    /// Model override; the provider default when `None`
    pub model: Option<String>,
    /// Maximum tokens per completion
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            tool_call_behavior: ToolCallBehavior::None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

impl PromptSettings {
    /// Settings with [`ToolCallBehavior::AutoInvoke`]
    #[must_use]
    pub fn auto_invoke() -> Self {
        Self {
            tool_call_behavior: ToolCallBehavior::AutoInvoke,
            ..Default::default()
        }
    }

    /// Set the iteration cap
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
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
