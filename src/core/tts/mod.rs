pub mod azure;
mod base;
mod chunk;
pub mod provider;

pub use azure::{AzureTTS, AzureTTSConfig};
pub use base::{BaseTTS, TTSError, TTSResult};
pub use chunk::{AudioChunks, chunk};
pub use provider::{TTSProvider, TTSRequestBuilder};
