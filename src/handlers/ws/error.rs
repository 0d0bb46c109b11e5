//! WebSocket error types
//!
//! Every variant is reported to the client as an `error` event; none of
//! them closes the connection.

use thiserror::Error;

use crate::core::llm::LLMError;
use crate::core::stt::STTError;
use crate::core::tts::TTSError;

#[derive(Debug, Error)]
pub enum WebSocketError {
    /// Frame is not a valid envelope or the payload has the wrong shape
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Invalid base64 audio: {0}")]
    InvalidAudioEncoding(#[from] base64::DecodeError),

    #[error("Failed to start recognition: {0}")]
    RecognizerStart(STTError),

    #[error("Failed to process audio: {0}")]
    AudioProcessing(STTError),

    #[error("Failed to generate reply: {0}")]
    Generation(#[from] LLMError),

    #[error("Failed to synthesize speech: {0}")]
    SpeechSynthesis(#[from] TTSError),
}

/// Result type for WebSocket operations
pub type WebSocketResult<T> = Result<T, WebSocketError>;
