//! Application configuration
//!
//! - `loader`: layered loading (embedded defaults, files, environment)

mod loader;

pub use loader::load_config;

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokendiff_llm::util::mask_api_key;
use tokendiff_llm::{Error, OpenAiConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Which chat-completions service to call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Azure,
    OpenAi,
}

/// LLM connection settings
#[derive(Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    tokendiff_llm::openai::DEFAULT_AZURE_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LlmConfig {
    /// Build the provider configuration.
    ///
    /// Empty `api_key` / `endpoint` fall back to the conventional
    /// environment variables, looked up through `env`.
    pub fn provider_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> tokendiff_llm::Result<OpenAiConfig> {
        let setting_or_env = |value: &str, var: &str| {
            let value = value.trim();
            if value.is_empty() {
                env(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
            } else {
                Some(value.to_string())
            }
        };
        let timeout = Duration::from_secs(self.timeout_secs);

        match self.provider {
            ProviderKind::Azure => {
                let api_key = setting_or_env(&self.api_key, "AZURE_OPENAI_API_KEY").ok_or_else(
                    || Error::NotConfigured("set llm.api_key or AZURE_OPENAI_API_KEY".to_string()),
                )?;
                let endpoint = setting_or_env(&self.endpoint, "AZURE_OPENAI_ENDPOINT")
                    .ok_or_else(|| {
                        Error::NotConfigured(
                            "set llm.endpoint or AZURE_OPENAI_ENDPOINT".to_string(),
                        )
                    })?;
                if self.deployment.trim().is_empty() {
                    return Err(Error::NotConfigured(
                        "llm.deployment is required for Azure OpenAI".to_string(),
                    ));
                }
                Ok(
                    OpenAiConfig::azure(endpoint, self.deployment.trim(), api_key)
                        .with_api_version(&self.api_version)
                        .with_timeout(timeout),
                )
            }
            ProviderKind::OpenAi => {
                let api_key = setting_or_env(&self.api_key, "OPENAI_API_KEY").ok_or_else(|| {
                    Error::NotConfigured("set llm.api_key or OPENAI_API_KEY".to_string())
                })?;
                let mut config = OpenAiConfig::openai(api_key).with_timeout(timeout);
                if !self.deployment.trim().is_empty() {
                    config = config.with_model(self.deployment.trim());
                }
                if !self.endpoint.trim().is_empty() {
                    config = config.with_endpoint(self.endpoint.trim());
                }
                Ok(config)
            }
        }
    }
}

/// Prompt and tool-loop settings
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_prompt() -> String {
    "Please turn on the lamp".to_string()
}

fn default_max_iterations() -> usize {
    8
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}
