//! `tokendiff run`
//!
//! Wires the pipeline
//! `Kernel -> OpenAiProvider -> UsageInterceptor -> ReqwestTransport`,
//! invokes the prompt and prints both usage reports.

use super::report::Report;
use crate::settings::load_config;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokendiff_core::{Kernel, PromptSettings};
use tokendiff_llm::{
    LlmProvider, OpenAiProvider, RateLimitTracker, ReqwestTransport, UsageInterceptor,
    UsageMetrics,
};
use tokendiff_tools::{register_lights, LightStore, RunnerConfig, ToolRegistry, ToolRunner};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run(prompt: Option<String>) -> Result<()> {
    let config = load_config()?;
    let provider_config = config
        .llm
        .provider_config(|name| std::env::var(name).ok())
        .context("LLM provider is not configured")?;

    let metrics = Arc::new(UsageMetrics::new());
    let rate_limits = Arc::new(RateLimitTracker::new());
    let transport =
        ReqwestTransport::new(provider_config.timeout).context("Failed to build HTTP client")?;
    let interceptor = Arc::new(
        UsageInterceptor::new(transport, Arc::clone(&metrics))
            .with_rate_limit_hook(rate_limits.clone()),
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling request");
                cancel.cancel();
            }
        }
    });

    let provider = OpenAiProvider::new(provider_config, interceptor.clone())
        .with_cancellation(cancel);

    let mut registry = ToolRegistry::new();
    register_lights(&mut registry, Arc::new(LightStore::new()));
    info!(tools = ?registry.list_names(), "Tools registered");
    let runner = ToolRunner::new(
        Arc::new(registry),
        RunnerConfig::new(Duration::from_secs(config.agent.tool_timeout_secs)),
    );

    let kernel = Kernel::new(Arc::new(provider), runner);
    let prompt = prompt.unwrap_or(config.agent.prompt);
    let settings =
        PromptSettings::auto_invoke().with_max_iterations(config.agent.max_iterations);

    info!(
        provider = %kernel.provider().name(),
        model = %kernel.provider().default_model(),
        "Starting TokenDiff v{}",
        env!("CARGO_PKG_VERSION")
    );

    let result = kernel.invoke_prompt(&prompt, &settings).await;
    // Totals are read only after every pending extraction has landed
    debug!(pending = interceptor.pending(), "Flushing usage extraction");
    interceptor.flush().await;
    let result = result.context("Prompt invocation failed")?;

    let report = Report {
        response: &result.text,
        kernel_usage: result.metadata.usage,
        http_usage: metrics.summary().await,
        rate_limit: rate_limits.latest(),
    };
    let rendered = report
        .render(std::io::stdout().is_terminal())
        .context("Failed to render report")?;
    print!("{rendered}");

    Ok(())
}
