//! Reply generation for finished transcripts.

pub mod azure_openai;
mod base;

pub use azure_openai::{AzureOpenAIClient, AzureOpenAIConfig};
pub use base::{BaseLLM, LLMError};

/// Generate the assistant reply for one transcript.
pub async fn generate(client: &dyn BaseLLM, transcript: &str) -> Result<String, LLMError> {
    tracing::debug!(
        "Generating reply with {} ({} chars of transcript)",
        client.get_provider_info(),
        transcript.chars().count()
    );
    client.generate(transcript).await
}
