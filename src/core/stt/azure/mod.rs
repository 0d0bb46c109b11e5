//! Microsoft Azure Speech-to-Text streaming recognition.
//!
//! - [`config`]: URL, audio format and validation (`AzureSTTConfig`)
//! - [`messages`]: parsing of the header-prefixed service messages
//! - [`client`]: the `AzureSTT` recognizer
//! - [`factory`]: per-turn recognizer creation (`AzureSTTFactory`)
//!
//! # Example
//!
//! ```rust,no_run
//! use voice_relay::core::stt::{AzureSTTFactory, STTFactory, STTResult};
//! use std::future::Future;
//! use std::pin::Pin;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = AzureSTTFactory::new("your-speech-key", "westeurope", "ar-EG")?;
//! let mut stt = factory.create(16000)?;
//!
//! stt.on_result(Arc::new(|result: STTResult| {
//!     Box::pin(async move {
//!         println!("{} (final: {})", result.transcript, result.is_final);
//!     }) as Pin<Box<dyn Future<Output = ()> + Send>>
//! }))
//! .await?;
//!
//! stt.start().await?;
//! stt.write_chunk(vec![0u8; 3200].into()).await?;
//! stt.stop().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod factory;
mod messages;


pub use client::{AzureSTT, MAX_AUDIO_CHUNK_SIZE};
pub use config::{
    AzureOutputFormat, AzureProfanityOption, AzureSTTConfig, DEFAULT_STOP_TIMEOUT,
    MAX_SAMPLE_RATE, MIN_SAMPLE_RATE,
};
pub use factory::AzureSTTFactory;
pub use messages::{AzureMessage, RecognitionStatus, SpeechHypothesis, SpeechPhrase};
