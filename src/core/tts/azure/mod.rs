//! Microsoft Azure Speech synthesis.
//!
//! `POST https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! with an SSML body. The voice name selects the speaker and its locale
//! prefix becomes the document language.

mod config;
mod provider;

pub use config::{
    AzureTTSConfig, DEFAULT_REQUEST_TIMEOUT, build_ssml, escape_xml, language_from_voice,
};
pub use provider::AzureTTS;
