use std::time::Duration;

use zeroize::Zeroize;

use crate::config::{DEFAULT_TTS_OUTPUT_FORMAT, DEFAULT_TTS_VOICE, ServerConfig};
use crate::core::providers::azure::AzureRegion;
use crate::core::tts::base::TTSError;

/// Locale used when it cannot be read from the voice name
const FALLBACK_LANGUAGE: &str = "en-US";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap `text` in a single-voice SSML document.
pub fn build_ssml(text: &str, voice_name: &str, language: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        language,
        escape_xml(voice_name),
        escape_xml(text)
    )
}

/// Locale prefix of an Azure voice name.
///
/// `ar-EG-SalmaNeural` gives `ar-EG`, `zh-Hans-CN-XiaochenNeural` gives
/// `zh-Hans-CN`.
pub fn language_from_voice(voice_name: &str) -> Option<String> {
    let parts: Vec<&str> = voice_name.split('-').collect();
    let is_region = |part: &str| part.len() == 2 && part.chars().all(|c| c.is_ascii_uppercase());
    let is_script = |part: &str| {
        part.len() == 4
            && part.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && part.chars().skip(1).all(|c| c.is_ascii_lowercase())
    };

    match parts.as_slice() {
        [lang, script, region, ..] if is_script(*script) && is_region(*region) => {
            Some(format!("{lang}-{script}-{region}"))
        }
        [lang, region, ..] if is_region(*region) => Some(format!("{lang}-{region}")),
        _ => None,
    }
}

#[derive(Clone)]
pub struct AzureTTSConfig {
    pub api_key: String,
    pub region: AzureRegion,
    /// Neural voice, e.g. "ar-EG-SalmaNeural"
    pub voice: String,
    /// Value of `X-Microsoft-OutputFormat`
    pub output_format: String,
    /// Replaces `https://<region>.tts.speech.microsoft.com` when set
    pub endpoint: Option<String>,
    pub request_timeout: Duration,
}

impl AzureTTSConfig {
    pub fn new(api_key: impl Into<String>, region: impl Into<AzureRegion>) -> Self {
        Self {
            api_key: api_key.into(),
            region: region.into(),
            voice: DEFAULT_TTS_VOICE.to_string(),
            output_format: DEFAULT_TTS_OUTPUT_FORMAT.to_string(),
            endpoint: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_server_config(config: &ServerConfig) -> Result<Self, TTSError> {
        let (key, region) = config
            .azure_speech_credentials()
            .map_err(TTSError::ConfigurationError)?;

        let mut tts_config = Self::new(key, region.as_str());
        tts_config.voice = config.tts_voice.clone();
        tts_config.output_format = config.tts_output_format.clone();
        Ok(tts_config)
    }

    pub fn build_tts_url(&self) -> String {
        match self.endpoint.as_deref() {
            Some(endpoint) => format!("{}/cognitiveservices/v1", endpoint.trim_end_matches('/')),
            None => self.region.tts_rest_url(),
        }
    }

    pub fn language_code(&self) -> String {
        language_from_voice(&self.voice).unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
    }

    pub fn build_ssml_for_text(&self, text: &str) -> String {
        build_ssml(text, &self.voice, &self.language_code())
    }

    pub fn validate(&self) -> Result<(), TTSError> {
        if self.api_key.trim().is_empty() {
            return Err(TTSError::ConfigurationError(
                "Azure Speech key is required (AZURE_SPEECH_KEY)".to_string(),
            ));
        }
        if self.region.as_str().is_empty() && self.endpoint.is_none() {
            return Err(TTSError::ConfigurationError(
                "Azure Speech region is required (AZURE_SPEECH_REGION)".to_string(),
            ));
        }
        if self.voice.trim().is_empty() {
            return Err(TTSError::ConfigurationError(
                "AZURE_TTS_VOICE must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AzureTTSConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureTTSConfig")
            .field("region", &self.region)
            .field("voice", &self.voice)
            .field("output_format", &self.output_format)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Drop for AzureTTSConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}
