use std::env;
use std::path::PathBuf;

use super::utils::{parse_bool, parse_env};
use super::yaml::YamlConfig;
use super::{
    DEFAULT_AZURE_OPENAI_API_VERSION, DEFAULT_LLM_SYSTEM_PROMPT, DEFAULT_STT_LANGUAGE,
    DEFAULT_TTS_CHUNK_SIZE, DEFAULT_TTS_OUTPUT_FORMAT, DEFAULT_TTS_VOICE, ServerConfig, TlsConfig,
};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
///
/// # Returns
/// * `Result<ServerConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env::var($env_var).ok())
        };
    }

    // YAML > parsed ENV > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => parse_env($env_var)?.unwrap_or($default),
            }
        };
    }

    let server = yaml.server.as_ref();
    let speech = yaml.azure_speech.as_ref();
    let openai = yaml.azure_openai.as_ref();
    let llm = yaml.llm.as_ref();
    let session = yaml.session.as_ref();
    let security = yaml.security.as_ref();

    // Server configuration
    let host = get_value!("HOST", server.and_then(|s| s.host.clone()), "0.0.0.0");
    let port: u16 = get_parsed!("PORT", server.and_then(|s| s.port), 8000);

    // TLS configuration
    let tls_yaml = server.and_then(|s| s.tls.as_ref());
    let tls_enabled = match tls_yaml.and_then(|t| t.enabled) {
        Some(enabled) => enabled,
        None => env::var("TLS_ENABLED")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false),
    };
    let tls = if tls_enabled {
        let cert_path = get_optional!(
            "TLS_CERT_PATH",
            tls_yaml.and_then(|t| t.cert_path.clone())
        )
        .ok_or("TLS_CERT_PATH is required when TLS is enabled")?;
        let key_path = get_optional!("TLS_KEY_PATH", tls_yaml.and_then(|t| t.key_path.clone()))
            .ok_or("TLS_KEY_PATH is required when TLS is enabled")?;
        Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        })
    } else {
        None
    };

    // Azure Speech
    let azure_speech_key = get_optional!("AZURE_SPEECH_KEY", speech.and_then(|s| s.key.clone()));
    let azure_speech_region = get_optional!(
        "AZURE_SPEECH_REGION",
        speech.and_then(|s| s.region.clone())
    );
    let stt_language = get_value!(
        "AZURE_STT_LANGUAGE",
        speech.and_then(|s| s.stt_language.clone()),
        DEFAULT_STT_LANGUAGE
    );
    let tts_voice = get_value!(
        "AZURE_TTS_VOICE",
        speech.and_then(|s| s.tts_voice.clone()),
        DEFAULT_TTS_VOICE
    );
    let tts_output_format = get_value!(
        "AZURE_TTS_OUTPUT_FORMAT",
        speech.and_then(|s| s.tts_output_format.clone()),
        DEFAULT_TTS_OUTPUT_FORMAT
    );

    // Azure OpenAI
    let azure_openai_key = get_optional!("AZURE_OPENAI_KEY", openai.and_then(|o| o.key.clone()));
    let azure_openai_endpoint = get_optional!(
        "AZURE_OPENAI_ENDPOINT",
        openai.and_then(|o| o.endpoint.clone())
    );
    let azure_openai_api_version = get_value!(
        "AZURE_OPENAI_API_VERSION",
        openai.and_then(|o| o.api_version.clone()),
        DEFAULT_AZURE_OPENAI_API_VERSION
    );
    let azure_openai_deployment = get_optional!(
        "AZURE_OPENAI_DEPLOYMENT",
        openai.and_then(|o| o.deployment.clone())
    );

    // Generation parameters
    let llm_system_prompt = get_value!(
        "LLM_SYSTEM_AR",
        llm.and_then(|l| l.system_prompt.clone()),
        DEFAULT_LLM_SYSTEM_PROMPT
    );
    let llm_max_tokens: u32 = get_parsed!("LLM_MAX_TOKENS", llm.and_then(|l| l.max_tokens), 150);
    let llm_temperature: f32 =
        get_parsed!("LLM_TEMPERATURE", llm.and_then(|l| l.temperature), 0.7);

    // Session settings
    let tts_chunk_size: usize = get_parsed!(
        "TTS_CHUNK_SIZE",
        session.and_then(|s| s.tts_chunk_size),
        DEFAULT_TTS_CHUNK_SIZE
    );
    let stt_stop_timeout_seconds: u64 = get_parsed!(
        "STT_STOP_TIMEOUT_SECONDS",
        session.and_then(|s| s.stt_stop_timeout_seconds),
        10
    );

    // Security configuration
    let cors_allowed_origins = get_optional!(
        "CORS_ALLOWED_ORIGINS",
        security.and_then(|s| s.cors_allowed_origins.clone())
    )
    .or_else(|| Some("*".to_string()))
    .filter(|origins| !origins.trim().is_empty());
    let rate_limit_requests_per_second: u32 = get_parsed!(
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        security.and_then(|s| s.rate_limit_requests_per_second),
        60
    );
    let rate_limit_burst_size: u32 = get_parsed!(
        "RATE_LIMIT_BURST_SIZE",
        security.and_then(|s| s.rate_limit_burst_size),
        10
    );

    Ok(ServerConfig {
        host,
        port,
        tls,
        azure_speech_key,
        azure_speech_region,
        stt_language,
        tts_voice,
        tts_output_format,
        azure_openai_key,
        azure_openai_endpoint,
        azure_openai_api_version,
        azure_openai_deployment,
        llm_system_prompt,
        llm_max_tokens,
        llm_temperature,
        tts_chunk_size,
        stt_stop_timeout_seconds,
        cors_allowed_origins,
        rate_limit_requests_per_second,
        rate_limit_burst_size,
    })
}
