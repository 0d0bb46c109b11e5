use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::llm::{AzureOpenAIClient, BaseLLM, LLMError};
use crate::core::stt::{AzureSTTFactory, STTError, STTFactory};
use crate::core::tts::{AzureTTS, BaseTTS, TTSError};

/// Failure to build one of the shared provider clients at startup
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("speech recognition: {0}")]
    Recognition(#[from] STTError),
    #[error("language model: {0}")]
    Generation(#[from] LLMError),
    #[error("speech synthesis: {0}")]
    Synthesis(#[from] TTSError),
}

/// Application state shared by every connection.
///
/// The provider handles are built once and only read afterwards; each
/// voice session asks `stt_factory` for its own recognizer per turn.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub stt_factory: Arc<dyn STTFactory>,
    pub llm: Arc<dyn BaseLLM>,
    pub tts: Arc<dyn BaseTTS>,
}

impl AppState {
    /// Build the Azure clients from `config`.
    ///
    /// Missing credentials fail here so the server never starts half
    /// configured.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, StateError> {
        let stt_factory = AzureSTTFactory::from_config(&config)?;
        let llm = AzureOpenAIClient::from_config(&config)?;
        let tts = AzureTTS::from_config(&config)?;

        info!(
            "Providers ready: recognition region {}, language {}",
            stt_factory.region(),
            stt_factory.language()
        );

        Ok(Self::with_providers(
            config,
            Arc::new(stt_factory),
            Arc::new(llm),
            Arc::new(tts),
        ))
    }

    /// Assemble the state from already built providers.
    pub fn with_providers(
        config: ServerConfig,
        stt_factory: Arc<dyn STTFactory>,
        llm: Arc<dyn BaseLLM>,
        tts: Arc<dyn BaseTTS>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            stt_factory,
            llm,
            tts,
        })
    }
}
