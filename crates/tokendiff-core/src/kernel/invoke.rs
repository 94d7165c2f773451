//! Kernel main loop
//!
//! Sends the conversation to the model, runs any tool calls it returns,
//! appends their results and asks again until the model answers in text.

use crate::error::{Error, Result};
use tokendiff_llm::{CompletionRequest, Message, ToolCompletionRequest};
use tracing::{debug, info, instrument, warn};

use super::config::{PromptSettings, ToolCallBehavior};
use super::core::Kernel;
use super::types::{PromptMetadata, PromptResult};

impl Kernel {
    /// Run `prompt` and return the model's final answer.
    ///
    /// With [`ToolCallBehavior::AutoInvoke`] every enabled tool is offered to
    /// the model and the calls it makes are executed between turns. Otherwise,
    /// or when the provider cannot call tools, the prompt is a plain text
    /// completion. Fails
    /// with [`Error::MaxIterations`] when the model is still calling tools
    /// after `settings.max_iterations` round trips.
    #[instrument(skip(self, prompt, settings), fields(
        provider = %self.provider.name(),
        behavior = ?settings.tool_call_behavior
    ))]
    pub async fn invoke_prompt(
        &self,
        prompt: &str,
        settings: &PromptSettings,
    ) -> Result<PromptResult> {
        let mut messages = Vec::with_capacity(4);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.as_str()));
        }
        messages.push(Message::user(prompt));

        let auto_invoke = match settings.tool_call_behavior {
            ToolCallBehavior::AutoInvoke if !self.provider.supports_tools() => {
                warn!("Provider does not support tool calls, sending prompt without tools");
                false
            }
            ToolCallBehavior::AutoInvoke => true,
            ToolCallBehavior::None => false,
        };
        let tools = if auto_invoke {
            self.runner.registry().to_llm_tools()
        } else {
            Vec::new()
        };
        let model = settings.model.clone().unwrap_or_default();

        info!(tools = tools.len(), "Invoking prompt");

        let mut invocations = Vec::new();

        for iteration in 1..=settings.max_iterations {
            let mut request = CompletionRequest::new(model.as_str()).with_messages(messages.clone());
            request.max_tokens = settings.max_tokens;
            request.temperature = settings.temperature;

            let response = if auto_invoke {
                self.provider
                    .complete_with_tools(ToolCompletionRequest::new(request, tools.clone()))
                    .await?
            } else {
                self.provider.complete(request).await?.into()
            };

            debug!(
                iteration,
                tool_calls = response.tool_calls.len(),
                finish_reason = ?response.finish_reason,
                "Model responded"
            );

            if !response.has_tool_calls() {
                info!(iterations = iteration, tool_calls = invocations.len(), "Prompt completed");
                let metadata = PromptMetadata::from_response(&response, iteration, invocations);
                return Ok(PromptResult {
                    text: response.content.unwrap_or_default(),
                    metadata,
                });
            }

            messages.push(Message::assistant_with_tool_calls(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let invocation = self.execute_tool_call(call).await;
                messages.push(Message::tool_response(
                    &call.id,
                    &call.name,
                    invocation.output.to_string(),
                ));
                invocations.push(invocation);
            }
        }

        warn!(max_iterations = settings.max_iterations, "Max iterations reached");
        Err(Error::MaxIterations(settings.max_iterations))
    }
}
