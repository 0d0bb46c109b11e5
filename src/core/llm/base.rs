#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Model returned no reply")]
    EmptyResponse,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Single-shot reply generation.
///
/// Implementations are stateless: each call sends the configured system
/// instruction and the transcript, with no history from earlier turns.
#[async_trait::async_trait]
pub trait BaseLLM: Send + Sync {
    async fn generate(&self, transcript: &str) -> Result<String, LLMError>;

    fn get_provider_info(&self) -> &'static str;
}
