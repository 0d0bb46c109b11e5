//! Microsoft Azure Speech Services provider infrastructure.
//!
//! Region endpoints and authentication headers shared by the Azure Speech
//! recognizer (`core::stt::azure`) and synthesizer (`core::tts::azure`).
//!
//! Both services authenticate with the resource key passed in the
//! `Ocp-Apim-Subscription-Key` header. The key is bound to the region the
//! Speech resource was created in.

mod region;

pub use region::AzureRegion;

/// Header carrying the Speech resource key
pub const AZURE_SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Header carrying the client-generated connection id (STT WebSocket)
pub const AZURE_CONNECTION_ID_HEADER: &str = "X-ConnectionId";

/// Header selecting the synthesis audio format (TTS REST)
pub const AZURE_OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// Generate a connection id in the format Azure expects (32 hex chars, no dashes).
pub fn generate_connection_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
