use std::time::Duration;

use zeroize::Zeroize;

use crate::config::{DEFAULT_AZURE_OPENAI_API_VERSION, DEFAULT_LLM_SYSTEM_PROMPT, ServerConfig};
use crate::core::llm::base::LLMError;

pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one Azure OpenAI chat deployment
#[derive(Clone)]
pub struct AzureOpenAIConfig {
    pub api_key: String,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl AzureOpenAIConfig {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_AZURE_OPENAI_API_VERSION.to_string(),
            system_prompt: DEFAULT_LLM_SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_server_config(config: &ServerConfig) -> Result<Self, LLMError> {
        let required = |value: &Option<String>, var: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    LLMError::ConfigurationError(format!(
                        "{var} not configured in server environment"
                    ))
                })
        };

        let mut llm_config = Self::new(
            required(&config.azure_openai_key, "AZURE_OPENAI_KEY")?,
            required(&config.azure_openai_endpoint, "AZURE_OPENAI_ENDPOINT")?,
            required(&config.azure_openai_deployment, "AZURE_OPENAI_DEPLOYMENT")?,
        );
        llm_config.api_version = config.azure_openai_api_version.clone();
        llm_config.system_prompt = config.llm_system_prompt.clone();
        llm_config.max_tokens = config.llm_max_tokens;
        llm_config.temperature = config.llm_temperature;
        Ok(llm_config)
    }

    /// `{endpoint}/openai/deployments/{deployment}/chat/completions`
    ///
    /// The `api-version` query parameter is added by the client.
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            self.deployment
        )
    }
}

impl std::fmt::Debug for AzureOpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAIConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl Drop for AzureOpenAIConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}
