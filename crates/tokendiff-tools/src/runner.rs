//! Runner - Tool execution engine
//!
//! Looks tools up in the registry, validates input and runs them under a
//! timeout. A tool that returns an error becomes a failed [`ToolResult`];
//! only lookup, validation and timeout problems are returned as `Err`.

use crate::error::{Error, Result};
use crate::registry::{ToolRegistry, ToolResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Configuration for the tool runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Timeout for a single tool execution
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl RunnerConfig {
    /// Create a configuration with the given execution timeout
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Tool execution result with additional metadata
#[derive(Debug)]
pub struct ExecutionResult {
    /// The tool result
    pub result: ToolResult,
    /// Tool name
    pub tool_name: String,
}

/// Executes registered tools
#[derive(Clone)]
pub struct ToolRunner {
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
}

impl ToolRunner {
    /// Create a new tool runner
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, RunnerConfig::default())
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute a tool by name
    #[instrument(skip(self, input), fields(tool = %tool_name))]
    pub async fn execute(
        &self,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<ExecutionResult> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| Error::NotFound(tool_name.to_string()))?;

        tool.validate_input(&input)?;

        let execution_timeout = self.config.timeout;
        let start = Instant::now();
        debug!(tool = %tool_name, timeout_ms = %execution_timeout.as_millis(), "Executing tool");

        let result = match timeout(execution_timeout, tool.execute(input)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let duration = start.elapsed().as_millis() as u64;
                warn!(tool = %tool_name, error = %e, "Tool execution failed");
                ToolResult::failure(e.to_string(), duration)
            }
            Err(_) => {
                let duration = start.elapsed().as_millis() as u64;
                warn!(tool = %tool_name, timeout_ms = %execution_timeout.as_millis(), "Tool execution timed out");
                return Err(Error::Timeout(duration));
            }
        };

        debug!(
            tool = %tool_name,
            success = %result.success,
            duration_ms = %result.duration_ms,
            "Tool execution completed"
        );

        Ok(ExecutionResult {
            result,
            tool_name: tool_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Tool, ToolDefinition};

    struct Sleepy {
        definition: ToolDefinition,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl Tool for Sleepy {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, _input: serde_json::Value) -> Result<ToolResult> {
            tokio::time::sleep(self.delay).await;
            Ok(ToolResult::success(serde_json::json!("done"), 0))
        }
    }

    struct Failing(ToolDefinition);

    #[async_trait::async_trait]
    impl Tool for Failing {
        fn definition(&self) -> &ToolDefinition {
            &self.0
        }

        async fn execute(&self, _input: serde_json::Value) -> Result<ToolResult> {
            Err(Error::Execution("bulb blew".to_string()))
        }
    }

    fn runner_with(tools: Vec<Arc<dyn Tool>>, config: RunnerConfig) -> ToolRunner {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        ToolRunner::new(Arc::new(registry), config)
    }

    fn sleepy(name: &str, delay: Duration) -> Arc<dyn Tool> {
        Arc::new(Sleepy {
            definition: ToolDefinition::new(name, "sleeps"),
            delay,
        })
    }

    #[test]
    fn test_runner_config() {
        assert_eq!(RunnerConfig::default().timeout, Duration::from_secs(30));
        assert_eq!(
            RunnerConfig::new(Duration::from_secs(60)).timeout,
            Duration::from_secs(60)
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let runner = runner_with(Vec::new(), RunnerConfig::default());
        let result = runner.execute("nope", serde_json::json!({})).await;
        assert!(matches!(result, Err(Error::NotFound(name)) if name == "nope"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = runner_with(
            vec![sleepy("slow", Duration::from_secs(5))],
            RunnerConfig::new(Duration::from_millis(10)),
        );
        let result = runner.execute("slow", serde_json::json!({})).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_tool_error_becomes_failed_result() {
        let runner = runner_with(
            vec![Arc::new(Failing(ToolDefinition::new("broken", "fails")))],
            RunnerConfig::default(),
        );
        let executed = runner.execute("broken", serde_json::json!({})).await.unwrap();
        assert_eq!(executed.tool_name, "broken");
        assert!(!executed.result.success);
        assert!(executed.result.error.unwrap().contains("bulb blew"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let runner = runner_with(
            vec![sleepy("fast", Duration::ZERO)],
            RunnerConfig::default(),
        );
        let result = runner.execute("fast", serde_json::json!("text")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let executed = runner.execute("fast", serde_json::json!({})).await.unwrap();
        assert!(executed.result.success);
    }
}
