pub mod llm;
pub mod providers;
pub mod stt;
pub mod tts;

// Re-export commonly used types for convenience
pub use stt::{
    AzureSTT, AzureSTTConfig, AzureSTTFactory, BaseSTT, STTConfig, STTError, STTErrorCallback,
    STTFactory, STTResult, STTResultCallback,
};

pub use llm::{AzureOpenAIClient, AzureOpenAIConfig, BaseLLM, LLMError};

pub use tts::{AudioChunks, AzureTTS, AzureTTSConfig, BaseTTS, TTSError, TTSResult, chunk};
