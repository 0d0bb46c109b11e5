//! # Voice relay WebSocket
//!
//! `GET /ws` upgrades to a voice session. Text frames carry JSON envelopes
//! `{"type": ..., "payload": ...}`; binary frames carry raw PCM.
//!
//! ## Client to server
//!
//! - `{"type": "audio_start", "payload": {"sample_rate": 16000}}` opens a turn
//!   (the payload and `sample_rate` are optional)
//! - `{"type": "audio_chunk_b64", "payload": "<base64 PCM>"}` feeds audio
//! - `{"type": "audio_end"}` closes the turn and requests the answer
//! - **Binary frames**: 16-bit mono PCM, same as `audio_chunk_b64`
//!
//! ## Server to client
//!
//! - `stt_partial` / `stt_final`: transcripts as they arrive
//! - `assistant_text`: the generated reply
//! - `tts_start`, `tts_chunk_b64` (base64 audio slices), `tts_end`
//! - `error`: the connection stays open after every error
//!
//! A turn with no final transcript produces no reply, and a reply that
//! synthesizes to no audio produces no `tts_*` events.

pub mod error;
mod handler;
pub mod messages;
pub mod session;

pub use error::{WebSocketError, WebSocketResult};
pub use handler::ws_voice_handler;
pub use messages::{DEFAULT_SAMPLE_RATE, IncomingMessage, MessageRoute, OutgoingMessage};
pub use session::{SessionState, TranscriptEvent, VoiceSession};
