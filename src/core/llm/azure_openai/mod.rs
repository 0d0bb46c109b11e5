//! Azure OpenAI chat completions.
//!
//! One POST per turn to
//! `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=..`
//! authenticated with the `api-key` header. The request carries the system
//! instruction and the user transcript only.

mod client;
mod config;
mod messages;

#[cfg(test)]
mod tests;

pub use client::AzureOpenAIClient;
pub use config::{
    AzureOpenAIConfig, DEFAULT_MAX_TOKENS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TEMPERATURE,
};
pub use messages::{AzureOpenAIError, AzureOpenAIErrorResponse, ChatCompletionResponse};
