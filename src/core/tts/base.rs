use bytes::Bytes;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TTSError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Single-shot text to audio synthesis.
#[async_trait::async_trait]
pub trait BaseTTS: Send + Sync {
    /// Synthesize `text` and return the complete encoded audio.
    ///
    /// An empty buffer means nothing was synthesized: either the text was
    /// blank or the service cancelled the request. Only transport failures
    /// are errors.
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes>;

    fn get_provider_info(&self) -> &'static str;
}
