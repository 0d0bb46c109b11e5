//! Shared HTTP plumbing for REST synthesis providers.
//!
//! A provider describes its request through [`TTSRequestBuilder`];
//! [`TTSProvider`] sends it and applies the common response rules.

use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::base::{TTSError, TTSResult};

/// Longest error body echoed into the logs
const MAX_LOGGED_ERROR_BODY: usize = 512;

/// Provider-specific part of a synthesis request.
pub trait TTSRequestBuilder: Send + Sync {
    /// Build the complete request (URL, headers and body) for `text`.
    fn build_http_request(&self, client: &Client, text: &str) -> reqwest::RequestBuilder;
}

/// Pooled HTTP client executing synthesis requests.
pub struct TTSProvider {
    client: Client,
}

impl TTSProvider {
    pub fn new(request_timeout: Duration) -> TTSResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                TTSError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Run one synthesis request.
    ///
    /// Blank text short-circuits to an empty buffer. A non-success status is
    /// logged and also yields an empty buffer.
    pub async fn synthesize_with<B: TTSRequestBuilder + ?Sized>(
        &self,
        builder: &B,
        text: &str,
    ) -> TTSResult<Bytes> {
        if text.trim().is_empty() {
            debug!("Skipping synthesis of blank text");
            return Ok(Bytes::new());
        }

        let response = builder
            .build_http_request(&self.client, text)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_LOGGED_ERROR_BODY).collect();
            warn!("Synthesis cancelled by the service ({}): {}", status, body);
            return Ok(Bytes::new());
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Failed to read audio: {e}")))?;

        debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
