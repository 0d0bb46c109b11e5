use std::time::Duration;

use zeroize::Zeroize;

use super::client::AzureSTT;
use super::config::{AzureSTTConfig, DEFAULT_STOP_TIMEOUT};
use crate::config::ServerConfig;
use crate::core::providers::azure::AzureRegion;
use crate::core::stt::base::{BaseSTT, STTConfig, STTError, STTFactory};

/// Creates one [`AzureSTT`] per turn from credentials validated at startup.
pub struct AzureSTTFactory {
    api_key: String,
    region: AzureRegion,
    language: String,
    stop_timeout: Duration,
    endpoint: Option<String>,
}

impl AzureSTTFactory {
    pub fn new(
        api_key: impl Into<String>,
        region: impl Into<AzureRegion>,
        language: impl Into<String>,
    ) -> Result<Self, STTError> {
        let api_key = api_key.into();
        let region = region.into();
        if api_key.trim().is_empty() {
            return Err(STTError::ConfigurationError(
                "Azure Speech key is required (AZURE_SPEECH_KEY)".to_string(),
            ));
        }
        if region.as_str().is_empty() {
            return Err(STTError::ConfigurationError(
                "Azure Speech region is required (AZURE_SPEECH_REGION)".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            region,
            language: language.into(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            endpoint: None,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, STTError> {
        let (key, region) = config
            .azure_speech_credentials()
            .map_err(STTError::ConfigurationError)?;

        Ok(Self::new(key, region.as_str(), config.stt_language.clone())?
            .with_stop_timeout(Duration::from_secs(config.stt_stop_timeout_seconds)))
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    /// Point recognizers at another WebSocket base URL (private endpoints, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn region(&self) -> &AzureRegion {
        &self.region
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl STTFactory for AzureSTTFactory {
    fn create(&self, sample_rate: u32) -> Result<Box<dyn BaseSTT>, STTError> {
        let base = STTConfig {
            api_key: self.api_key.clone(),
            language: self.language.clone(),
            sample_rate,
            channels: 1,
        };
        let mut config = AzureSTTConfig::new(base, self.region.clone());
        config.endpoint = self.endpoint.clone();
        config.stop_timeout = self.stop_timeout;

        Ok(Box::new(AzureSTT::new(config)?))
    }
}

impl Drop for AzureSTTFactory {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}
