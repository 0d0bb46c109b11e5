//! HTTP and WebSocket request handlers
//!
//! - `api` - health check and one-shot recognition of an uploaded clip
//! - `ws` - the voice relay WebSocket

pub mod api;
pub mod ws;

pub use ws::ws_voice_handler;
