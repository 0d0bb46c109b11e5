use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::config::AzureOpenAIConfig;
use super::messages::{
    AzureOpenAIErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
};
use crate::config::ServerConfig;
use crate::core::llm::base::{BaseLLM, LLMError};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Chat completions client for one Azure OpenAI deployment.
///
/// Built once at startup and shared by every session; the underlying
/// `reqwest::Client` keeps its connection pool across turns.
pub struct AzureOpenAIClient {
    config: AzureOpenAIConfig,
    http_client: Client,
}

impl AzureOpenAIClient {
    pub fn new(config: AzureOpenAIConfig) -> Result<Self, LLMError> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Azure OpenAI key is required (AZURE_OPENAI_KEY)".to_string(),
            ));
        }
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(LLMError::ConfigurationError(format!(
                "AZURE_OPENAI_ENDPOINT must be an http(s) URL, got '{}'",
                config.endpoint
            )));
        }

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                LLMError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            "Azure OpenAI client ready (deployment: {}, api-version: {})",
            config.deployment, config.api_version
        );

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, LLMError> {
        Self::new(AzureOpenAIConfig::from_server_config(config)?)
    }

    pub fn config(&self) -> &AzureOpenAIConfig {
        &self.config
    }

    fn error_from_status(status: StatusCode, body: &str) -> LLMError {
        let detail = match serde_json::from_str::<AzureOpenAIErrorResponse>(body) {
            Ok(error_response) => format!("Azure OpenAI error: {}", error_response.error),
            Err(_) => format!("Azure OpenAI error ({status}): {body}"),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LLMError::AuthenticationFailed(detail)
            }
            _ => LLMError::ProviderError(detail),
        }
    }
}

#[async_trait::async_trait]
impl BaseLLM for AzureOpenAIClient {
    async fn generate(&self, transcript: &str) -> Result<String, LLMError> {
        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage::system(&self.config.system_prompt),
                ChatMessage::user(transcript),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http_client
            .post(self.config.chat_completions_url())
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LLMError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let llm_error = Self::error_from_status(status, &response_text);
            error!("{}", llm_error);
            return Err(llm_error);
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LLMError::ProviderError(format!("Failed to parse response: {e}")))?;

        if let Some(reason) = completion
            .choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
        {
            debug!("Azure OpenAI finish reason: {}", reason);
        }

        match completion.first_content() {
            Some(reply) => Ok(reply.to_string()),
            None => {
                warn!("Azure OpenAI returned no reply content");
                Err(LLMError::EmptyResponse)
            }
        }
    }

    fn get_provider_info(&self) -> &'static str {
        "Azure OpenAI Chat Completions"
    }
}
