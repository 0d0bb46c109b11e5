//! Configuration module for the voice relay server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//! The configuration is split into logical submodules for maintainability.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voice_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::parse_bool;

/// Default recognition locale
pub const DEFAULT_STT_LANGUAGE: &str = "ar-EG";
/// Default neural voice used for synthesis
pub const DEFAULT_TTS_VOICE: &str = "ar-EG-SalmaNeural";
/// Default synthesis output format (MP3, 16 kHz, 32 kbit/s, mono)
pub const DEFAULT_TTS_OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";
/// Default Azure OpenAI REST API version
pub const DEFAULT_AZURE_OPENAI_API_VERSION: &str = "2024-06-01";
/// Default system instruction sent with every generation request
pub const DEFAULT_LLM_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
/// Default size of each outbound `tts_chunk_b64` slice in bytes
pub const DEFAULT_TTS_CHUNK_SIZE: usize = 24_000;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the relay, including:
/// - Server settings (host, port, TLS)
/// - Azure Speech credentials and voice/locale settings
/// - Azure OpenAI deployment settings
/// - Per-session tuning (chunk size, recognizer stop timeout)
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Azure Speech
    /// Azure Speech resource key (Azure Portal → Speech resource → Keys and Endpoint)
    pub azure_speech_key: Option<String>,
    /// Azure region where the Speech resource is deployed (e.g., "westeurope")
    pub azure_speech_region: Option<String>,
    /// Recognition locale, e.g. "ar-EG"
    pub stt_language: String,
    /// Synthesis voice name, e.g. "ar-EG-SalmaNeural"
    pub tts_voice: String,
    /// Value of the `X-Microsoft-OutputFormat` header
    pub tts_output_format: String,

    // Azure OpenAI
    pub azure_openai_key: Option<String>,
    /// Resource endpoint, e.g. "https://my-resource.openai.azure.com"
    pub azure_openai_endpoint: Option<String>,
    pub azure_openai_api_version: String,
    /// Chat model deployment name
    pub azure_openai_deployment: Option<String>,
    pub llm_system_prompt: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,

    // Session settings
    /// Size of each outbound audio slice in bytes
    pub tts_chunk_size: usize,
    /// Upper bound on how long stopping a recognizer may block
    pub stt_stop_timeout_seconds: u64,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            tls: None,
            azure_speech_key: None,
            azure_speech_region: None,
            stt_language: DEFAULT_STT_LANGUAGE.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            tts_output_format: DEFAULT_TTS_OUTPUT_FORMAT.to_string(),
            azure_openai_key: None,
            azure_openai_endpoint: None,
            azure_openai_api_version: DEFAULT_AZURE_OPENAI_API_VERSION.to_string(),
            azure_openai_deployment: None,
            llm_system_prompt: DEFAULT_LLM_SYSTEM_PROMPT.to_string(),
            llm_max_tokens: 150,
            llm_temperature: 0.7,
            tts_chunk_size: DEFAULT_TTS_CHUNK_SIZE,
            stt_stop_timeout_seconds: 10,
            cors_allowed_origins: Some("*".to_string()),
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Zeroize every secret when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.azure_speech_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.azure_openai_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Environment variables (with defaults) form the base and YAML values override them.
    /// The `.env` file is loaded in `main.rs` at startup, so its values behave like
    /// environment variables here.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Get the Azure Speech key and region
    ///
    /// Both values are required by recognition and synthesis. The key is bound to the
    /// region it was issued in.
    ///
    /// # Returns
    /// * `Result<(String, String), String>` - `(key, region)` on success
    pub fn azure_speech_credentials(&self) -> Result<(String, String), String> {
        let key = self
            .azure_speech_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .cloned()
            .ok_or_else(|| {
                "Azure Speech key not configured in server environment (AZURE_SPEECH_KEY)"
                    .to_string()
            })?;
        let region = self
            .azure_speech_region
            .as_ref()
            .filter(|r| !r.is_empty())
            .cloned()
            .ok_or_else(|| {
                "Azure Speech region not configured in server environment (AZURE_SPEECH_REGION)"
                    .to_string()
            })?;
        Ok((key, region))
    }

    /// Check whether every Azure OpenAI setting needed for generation is present
    pub fn has_azure_openai(&self) -> bool {
        self.azure_openai_key.is_some()
            && self.azure_openai_endpoint.is_some()
            && self.azure_openai_deployment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG_ENV_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "TLS_ENABLED",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "AZURE_SPEECH_KEY",
        "AZURE_SPEECH_REGION",
        "AZURE_STT_LANGUAGE",
        "AZURE_TTS_VOICE",
        "AZURE_TTS_OUTPUT_FORMAT",
        "AZURE_OPENAI_KEY",
        "AZURE_OPENAI_ENDPOINT",
        "AZURE_OPENAI_API_VERSION",
        "AZURE_OPENAI_DEPLOYMENT",
        "LLM_SYSTEM_AR",
        "LLM_MAX_TOKENS",
        "LLM_TEMPERATURE",
        "TTS_CHUNK_SIZE",
        "STT_STOP_TIMEOUT_SECONDS",
        "CORS_ALLOWED_ORIGINS",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
    ];

    fn cleanup_env_vars() {
        unsafe {
            for var in CONFIG_ENV_VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_file_ignores_cleared_environment() {
        unsafe {
            env::set_var("STT_STOP_TIMEOUT_SECONDS", "99");
            env::set_var("LLM_MAX_TOKENS", "999");
            env::set_var("AZURE_OPENAI_API_VERSION", "1999-01-01");
            env::set_var("AZURE_TTS_OUTPUT_FORMAT", "riff-8khz-8bit-mono-mulaw");
        }
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "server:\n  port: 8100\n").unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();
        assert_eq!(config.port, 8100);
        assert_eq!(config.stt_stop_timeout_seconds, 10);
        assert_eq!(config.llm_max_tokens, 150);
        assert_eq!(config.azure_openai_api_version, DEFAULT_AZURE_OPENAI_API_VERSION);
        assert_eq!(config.tts_output_format, DEFAULT_TTS_OUTPUT_FORMAT);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:8000");
        assert_eq!(config.stt_language, "ar-EG");
        assert_eq!(config.tts_voice, "ar-EG-SalmaNeural");
        assert_eq!(config.tts_chunk_size, 24_000);
        assert_eq!(config.llm_max_tokens, 150);
        assert!((config.llm_temperature - 0.7).abs() < f32::EPSILON);
        assert!(!config.is_tls_enabled());
        assert!(!config.has_azure_openai());
    }

    #[test]
    fn test_azure_speech_credentials_success() {
        let mut config = ServerConfig::default();
        config.azure_speech_key = Some("speech-key".to_string());
        config.azure_speech_region = Some("westeurope".to_string());

        let (key, region) = config.azure_speech_credentials().unwrap();
        assert_eq!(key, "speech-key");
        assert_eq!(region, "westeurope");
    }

    #[test]
    fn test_azure_speech_credentials_missing() {
        let mut config = ServerConfig::default();
        config.azure_speech_region = Some("westeurope".to_string());
        let err = config.azure_speech_credentials().unwrap_err();
        assert!(err.contains("AZURE_SPEECH_KEY"));

        config.azure_speech_key = Some("speech-key".to_string());
        config.azure_speech_region = Some(String::new());
        let err = config.azure_speech_credentials().unwrap_err();
        assert!(err.contains("AZURE_SPEECH_REGION"));
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

azure_speech:
  key: "yaml-speech-key"
  region: "eastus"
  stt_language: "en-US"
  tts_voice: "en-US-JennyNeural"

azure_openai:
  key: "yaml-openai-key"
  endpoint: "https://example.openai.azure.com"
  deployment: "gpt-4o-mini"

session:
  tts_chunk_size: 16000
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.azure_speech_key, Some("yaml-speech-key".to_string()));
        assert_eq!(config.azure_speech_region, Some("eastus".to_string()));
        assert_eq!(config.stt_language, "en-US");
        assert_eq!(config.tts_voice, "en-US-JennyNeural");
        assert_eq!(config.tts_chunk_size, 16000);
        assert!(config.has_azure_openai());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"

azure_speech:
  key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "9100");
            env::set_var("AZURE_SPEECH_KEY", "env-key");
            env::set_var("AZURE_SPEECH_REGION", "westeurope");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.azure_speech_key, Some("yaml-key".to_string()));
        // ENV fills what YAML leaves out
        assert_eq!(config.port, 9100);
        assert_eq!(config.azure_speech_region, Some("westeurope".to_string()));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_zero_chunk_size() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "session:\n  tts_chunk_size: 0\n").unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TTS_CHUNK_SIZE"));
    }
}
