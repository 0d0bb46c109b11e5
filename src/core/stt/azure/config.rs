//! Configuration for the Azure Speech-to-Text WebSocket client.

use std::time::Duration;

use crate::core::providers::azure::AzureRegion;
use crate::core::stt::base::STTConfig;

/// Minimum supported sample rate (8kHz telephony)
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Maximum supported sample rate
pub const MAX_SAMPLE_RATE: u32 = 48000;

/// Default bound on how long `stop()` may block
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Result payload format requested from the service.
///
/// `Detailed` adds an `NBest` list with per-alternative confidence scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AzureOutputFormat {
    Simple,
    #[default]
    Detailed,
}

impl AzureOutputFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Detailed => "detailed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AzureProfanityOption {
    #[default]
    Masked,
    Removed,
    Raw,
}

impl AzureProfanityOption {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Masked => "masked",
            Self::Removed => "removed",
            Self::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AzureSTTConfig {
    /// Key, locale and audio format
    pub base: STTConfig,
    pub region: AzureRegion,
    pub output_format: AzureOutputFormat,
    pub profanity: AzureProfanityOption,
    /// Replaces `wss://<region>.stt.speech.microsoft.com` when set
    pub endpoint: Option<String>,
    /// Upper bound for the graceful part of `stop()`
    pub stop_timeout: Duration,
}

impl AzureSTTConfig {
    pub fn new(base: STTConfig, region: AzureRegion) -> Self {
        Self {
            base,
            region,
            output_format: AzureOutputFormat::default(),
            profanity: AzureProfanityOption::default(),
            endpoint: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Conversation-mode recognition URL including the query string.
    pub fn build_websocket_url(&self) -> String {
        let base_url = self
            .endpoint
            .as_deref()
            .map(|endpoint| endpoint.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.region.stt_websocket_base_url());

        format!(
            "{}/speech/recognition/conversation/cognitiveservices/v1?language={}&format={}&profanity={}",
            base_url,
            self.base.language,
            self.output_format.as_str(),
            self.profanity.as_str()
        )
    }

    /// `Content-Type` announcing 16-bit PCM at the configured rate
    pub fn content_type(&self) -> String {
        format!(
            "audio/wav; codecs=audio/pcm; samplerate={}",
            self.base.sample_rate
        )
    }

    /// Check credentials and audio parameters before any connection attempt.
    pub fn validate(&self) -> Result<(), String> {
        if self.base.api_key.trim().is_empty() {
            return Err("Azure Speech key is required (AZURE_SPEECH_KEY)".to_string());
        }
        if self.region.as_str().is_empty() && self.endpoint.is_none() {
            return Err("Azure Speech region is required (AZURE_SPEECH_REGION)".to_string());
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.base.sample_rate) {
            return Err(format!(
                "Sample rate {} Hz is outside supported range ({}-{} Hz)",
                self.base.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            ));
        }
        if self.base.channels != 1 {
            return Err(format!(
                "Only mono audio is supported, got {} channels",
                self.base.channels
            ));
        }
        Ok(())
    }
}
