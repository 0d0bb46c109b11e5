//! WebSocket message types and routing
//!
//! Every text frame is an envelope `{"type": <string>, "payload": <any>}`.
//! Events without a payload omit the `payload` key.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::WebSocketError;

/// Recognition sample rate used when `audio_start` does not name one
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Default, Deserialize)]
struct AudioStartPayload {
    #[serde(default)]
    sample_rate: Option<u32>,
}

/// Client to server messages
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Open a recognition session for a new turn
    AudioStart { sample_rate: u32 },
    /// Base64 encoded PCM; decoded by the session
    AudioChunkB64(String),
    /// Raw PCM carried by a binary frame
    AudioChunk(Bytes),
    /// Close the recognition session and answer
    AudioEnd,
}

impl IncomingMessage {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, WebSocketError> {
        let envelope: RawEnvelope = serde_json::from_str(text)
            .map_err(|e| WebSocketError::InvalidMessage(e.to_string()))?;

        match envelope.message_type.as_str() {
            "audio_start" => {
                let payload = match envelope.payload {
                    Value::Null => AudioStartPayload::default(),
                    value => serde_json::from_value(value).map_err(|e| {
                        WebSocketError::InvalidMessage(format!("audio_start payload: {e}"))
                    })?,
                };
                Ok(Self::AudioStart {
                    sample_rate: payload.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
                })
            }
            "audio_chunk_b64" => match envelope.payload {
                Value::String(data) => Ok(Self::AudioChunkB64(data)),
                _ => Err(WebSocketError::InvalidMessage(
                    "audio_chunk_b64 payload must be a base64 string".to_string(),
                )),
            },
            "audio_end" => Ok(Self::AudioEnd),
            other => Err(WebSocketError::UnknownMessageType(other.to_string())),
        }
    }
}

/// Server to client events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutgoingMessage {
    SttPartial(String),
    SttFinal(String),
    AssistantText(String),
    TtsStart,
    TtsChunkB64(String),
    TtsEnd,
    Error(String),
}

impl OutgoingMessage {
    pub fn error(err: &WebSocketError) -> Self {
        Self::Error(err.to_string())
    }
}

/// Work items for the per-connection sender task
#[derive(Debug)]
pub enum MessageRoute {
    Outgoing(OutgoingMessage),
    /// Send a close frame and stop the sender
    Close,
}
