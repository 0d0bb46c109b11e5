use std::fmt;

/// Azure region a Speech resource is deployed in.
///
/// Stored normalized (lowercase, no whitespace) so that values copied from the
/// portal such as `"West Europe"` produce valid hostnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureRegion(String);

impl AzureRegion {
    pub fn new(region: &str) -> Self {
        let normalized: String = region
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        Self(normalized)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<region>.stt.speech.microsoft.com`
    pub fn stt_hostname(&self) -> String {
        format!("{}.stt.speech.microsoft.com", self.0)
    }

    /// `wss://<region>.stt.speech.microsoft.com`
    pub fn stt_websocket_base_url(&self) -> String {
        format!("wss://{}", self.stt_hostname())
    }

    /// `<region>.tts.speech.microsoft.com`
    pub fn tts_hostname(&self) -> String {
        format!("{}.tts.speech.microsoft.com", self.0)
    }

    /// Synthesis REST endpoint: `https://<region>.tts.speech.microsoft.com/cognitiveservices/v1`
    pub fn tts_rest_url(&self) -> String {
        format!("https://{}/cognitiveservices/v1", self.tts_hostname())
    }
}

impl fmt::Display for AzureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AzureRegion {
    fn from(region: &str) -> Self {
        Self::new(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_normalization() {
        assert_eq!(AzureRegion::new("West Europe").as_str(), "westeurope");
        assert_eq!(AzureRegion::new(" eastus2 ").as_str(), "eastus2");
        assert_eq!(AzureRegion::from("UAENorth").to_string(), "uaenorth");
    }

    #[test]
    fn test_region_endpoints() {
        let region = AzureRegion::new("westeurope");
        assert_eq!(region.stt_hostname(), "westeurope.stt.speech.microsoft.com");
        assert_eq!(
            region.stt_websocket_base_url(),
            "wss://westeurope.stt.speech.microsoft.com"
        );
        assert_eq!(region.tts_hostname(), "westeurope.tts.speech.microsoft.com");
        assert_eq!(
            region.tts_rest_url(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }
}
