//! Kernel tool execution

use std::time::Instant;
use tokendiff_llm::ToolCall;
use tracing::{info, warn};

use super::core::Kernel;
use super::types::ToolInvocation;

impl Kernel {
    /// Run one tool call. Failures are reported to the model as
    /// `{"error": ...}` rather than returned.
    pub(crate) async fn execute_tool_call(&self, call: &ToolCall) -> ToolInvocation {
        info!(tool = %call.name, args = %call.arguments, "Executing tool");

        // Malformed arguments fall back to an empty object
        let arguments: serde_json::Value = call.parse_arguments().unwrap_or_else(|e| {
            warn!(
                tool = %call.name,
                error = %e,
                arguments = %call.arguments,
                "Failed to parse tool arguments, using empty object"
            );
            serde_json::json!({})
        });

        let start = Instant::now();
        let result = self.runner.execute(&call.name, arguments.clone()).await;

        let (output, success, duration_ms) = match result {
            Ok(executed) => {
                let result = executed.result;
                let output = match (result.success, result.error) {
                    (true, _) => result.output,
                    (false, error) => serde_json::json!({
                        "error": error.unwrap_or_else(|| "unknown tool error".to_string())
                    }),
                };
                (output, result.success, result.duration_ms)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call rejected");
                (
                    serde_json::json!({"error": e.to_string()}),
                    false,
                    start.elapsed().as_millis() as u64,
                )
            }
        };

        ToolInvocation {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            arguments,
            output,
            success,
            duration_ms,
        }
    }
}
