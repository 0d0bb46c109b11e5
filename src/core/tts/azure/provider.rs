use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use super::config::AzureTTSConfig;
use crate::config::ServerConfig;
use crate::core::providers::azure::{AZURE_OUTPUT_FORMAT_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER};
use crate::core::tts::base::{BaseTTS, TTSResult};
use crate::core::tts::provider::{TTSProvider, TTSRequestBuilder};

const USER_AGENT: &str = concat!("voice-relay/", env!("CARGO_PKG_VERSION"));

struct AzureRequestBuilder {
    config: AzureTTSConfig,
}

impl TTSRequestBuilder for AzureRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        client
            .post(self.config.build_tts_url())
            .header(AZURE_SUBSCRIPTION_KEY_HEADER, &self.config.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header(AZURE_OUTPUT_FORMAT_HEADER, &self.config.output_format)
            .header("User-Agent", USER_AGENT)
            .body(self.config.build_ssml_for_text(text))
    }
}

/// Azure Speech synthesis over the REST endpoint.
///
/// One request per reply; the complete encoded audio comes back in the
/// response body.
pub struct AzureTTS {
    provider: TTSProvider,
    request_builder: AzureRequestBuilder,
}

impl AzureTTS {
    pub fn new(config: AzureTTSConfig) -> TTSResult<Self> {
        config.validate()?;
        let provider = TTSProvider::new(config.request_timeout)?;

        info!(
            "Azure TTS ready (voice: {}, format: {})",
            config.voice, config.output_format
        );

        Ok(Self {
            provider,
            request_builder: AzureRequestBuilder { config },
        })
    }

    pub fn from_config(config: &ServerConfig) -> TTSResult<Self> {
        Self::new(AzureTTSConfig::from_server_config(config)?)
    }

    pub fn azure_config(&self) -> &AzureTTSConfig {
        &self.request_builder.config
    }
}

#[async_trait]
impl BaseTTS for AzureTTS {
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        self.provider
            .synthesize_with(&self.request_builder, text)
            .await
    }

    fn get_provider_info(&self) -> &'static str {
        "Azure Speech Text-to-Speech REST"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::base::TTSError;
    use mockito::Matcher;
    use std::time::Duration;

    fn tts_for(server: &mockito::Server) -> AzureTTS {
        let mut config = AzureTTSConfig::new("speech-key", "westeurope");
        config.endpoint = Some(server.url());
        config.request_timeout = Duration::from_secs(2);
        AzureTTS::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_body() {
        let mut server = mockito::Server::new_async().await;
        let audio = vec![0xFFu8, 0xF3, 0x44, 0xC4, 0x00, 0x01];

        let mock = server
            .mock("POST", "/cognitiveservices/v1")
            .match_header("Ocp-Apim-Subscription-Key", "speech-key")
            .match_header("Content-Type", "application/ssml+xml")
            .match_header("X-Microsoft-OutputFormat", "audio-16khz-32kbitrate-mono-mp3")
            .match_header("User-Agent", Matcher::Regex("^voice-relay/".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("xml:lang='ar-EG'".to_string()),
                Matcher::Regex("<voice name='ar-EG-SalmaNeural'>".to_string()),
                Matcher::Regex("أهلا &amp; سهلا".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(audio.clone())
            .create_async()
            .await;

        let tts = tts_for(&server);
        let result = tts.synthesize("أهلا & سهلا").await.unwrap();

        assert_eq!(result.as_ref(), audio.as_slice());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_is_cancellation_not_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cognitiveservices/v1")
            .with_status(400)
            .with_body("Invalid SSML")
            .expect(1)
            .create_async()
            .await;

        let tts = tts_for(&server);
        let result = tts.synthesize("hello").await.unwrap();

        assert!(result.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_blank_text_sends_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cognitiveservices/v1")
            .expect(0)
            .create_async()
            .await;

        let tts = tts_for(&server);
        assert!(tts.synthesize("").await.unwrap().is_empty());
        assert!(tts.synthesize("   \n").await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = AzureTTSConfig::new("speech-key", "westeurope");
        config.endpoint = Some(format!("http://{addr}"));
        let tts = AzureTTS::new(config).unwrap();

        assert!(matches!(
            tts.synthesize("hello").await,
            Err(TTSError::NetworkError(_))
        ));
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let mut config = ServerConfig::default();
        assert!(matches!(
            AzureTTS::from_config(&config),
            Err(TTSError::ConfigurationError(_))
        ));

        config.azure_speech_key = Some("key".to_string());
        config.azure_speech_region = Some("westeurope".to_string());
        config.tts_voice = "en-US-JennyNeural".to_string();
        let tts = AzureTTS::from_config(&config).unwrap();
        assert_eq!(tts.azure_config().language_code(), "en-US");
    }
}
