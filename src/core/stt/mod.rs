pub mod azure;
mod base;

pub use base::{
    BaseSTT, STTConfig, STTError, STTErrorCallback, STTFactory, STTResult, STTResultCallback,
};

pub use azure::{AzureSTT, AzureSTTConfig, AzureSTTFactory};
