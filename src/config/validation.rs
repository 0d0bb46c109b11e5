use once_cell::sync::Lazy;
use regex::Regex;

use super::{ServerConfig, TlsConfig};

/// BCP-47 style locale accepted by Azure Speech, e.g. `ar-EG`, `en-US`, `zh-Hans-CN`
static LOCALE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2,3}(-[A-Z][a-z]{3})?-[A-Z]{2}$").expect("locale pattern is valid")
});

/// Run every validation rule against a merged configuration
pub fn validate_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_tls(&config.tls)?;
    validate_language(&config.stt_language)?;
    validate_llm(config.llm_max_tokens, config.llm_temperature)?;
    validate_session(config.tts_chunk_size, config.stt_stop_timeout_seconds)?;
    Ok(())
}

/// Validate TLS configuration
///
/// Both the certificate and the private key must exist on disk.
pub fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(tls) = tls else {
        return Ok(());
    };

    if !tls.cert_path.exists() {
        return Err(format!(
            "TLS_CERT_PATH file does not exist: {}",
            tls.cert_path.display()
        )
        .into());
    }
    if !tls.key_path.exists() {
        return Err(format!(
            "TLS_KEY_PATH file does not exist: {}",
            tls.key_path.display()
        )
        .into());
    }

    Ok(())
}

/// Validate the recognition locale
pub fn validate_language(language: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !LOCALE_PATTERN.is_match(language) {
        return Err(format!(
            "AZURE_STT_LANGUAGE must be a locale such as 'ar-EG' or 'en-US', got '{language}'"
        )
        .into());
    }
    Ok(())
}

/// Validate generation parameters
pub fn validate_llm(max_tokens: u32, temperature: f32) -> Result<(), Box<dyn std::error::Error>> {
    if max_tokens == 0 {
        return Err("LLM_MAX_TOKENS must be greater than 0".into());
    }
    if !(0.0..=2.0).contains(&temperature) {
        return Err(format!("LLM_TEMPERATURE must be between 0.0 and 2.0, got {temperature}").into());
    }
    Ok(())
}

/// Validate per-session settings
pub fn validate_session(
    tts_chunk_size: usize,
    stt_stop_timeout_seconds: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if tts_chunk_size == 0 {
        return Err("TTS_CHUNK_SIZE must be greater than 0".into());
    }
    if stt_stop_timeout_seconds == 0 {
        return Err("STT_STOP_TIMEOUT_SECONDS must be greater than 0".into());
    }
    Ok(())
}
