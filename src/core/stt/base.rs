use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A single transcription result delivered by a recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct STTResult {
    /// Recognized text
    pub transcript: String,
    /// `false` for partial hypotheses, `true` once the phrase is settled
    pub is_final: bool,
    /// Confidence score in `0.0..=1.0`
    pub confidence: f32,
}

impl STTResult {
    pub fn new(transcript: String, is_final: bool, confidence: f32) -> Self {
        Self {
            transcript,
            is_final,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Provider-agnostic recognition settings
#[derive(Debug, Clone)]
pub struct STTConfig {
    pub api_key: String,
    /// Recognition locale, e.g. "ar-EG"
    pub language: String,
    /// Sample rate of the pushed PCM audio in Hz
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "ar-EG".to_string(),
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Callback invoked for every delivered transcription result
pub type STTResultCallback =
    Arc<dyn Fn(STTResult) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback invoked when the recognition session fails or is cancelled
pub type STTErrorCallback =
    Arc<dyn Fn(STTError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum STTError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Recognizer is not started")]
    NotConnected,
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),
}

/// Streaming speech recognizer fed with pushed PCM audio.
///
/// A recognizer handle serves exactly one recognition session:
/// `start` once, any number of `write_chunk` calls, then `stop`.
#[async_trait::async_trait]
pub trait BaseSTT: Send + Sync {
    /// Open the streaming session with the provider.
    async fn start(&mut self) -> Result<(), STTError>;

    /// Append raw audio to the open session.
    ///
    /// Returns [`STTError::NotConnected`] before `start` and after `stop`.
    async fn write_chunk(&mut self, audio: Bytes) -> Result<(), STTError>;

    /// Close the audio input and block until the provider has finished the
    /// session and every pending callback has run.
    ///
    /// Idempotent. Provider-side failures are reported through the error
    /// callback, never returned from here.
    async fn stop(&mut self) -> Result<(), STTError>;

    /// Whether audio written now would reach the provider
    fn is_ready(&self) -> bool;

    async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError>;

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError>;

    fn get_provider_info(&self) -> &'static str;
}

/// Builds a fresh recognizer handle for every turn.
///
/// Implementations hold the validated credentials so per-turn creation never
/// has to touch configuration again.
pub trait STTFactory: Send + Sync {
    fn create(&self, sample_rate: u32) -> Result<Box<dyn BaseSTT>, STTError>;
}
