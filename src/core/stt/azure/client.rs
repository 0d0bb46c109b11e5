//! Azure Speech-to-Text WebSocket client.
//!
//! Audio is streamed as raw binary frames over the conversation-mode
//! recognition endpoint. The `Content-Type` announced during the handshake
//! tells the service the PCM sample rate, so no per-frame headers are needed.
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │  write_chunk() │────▶│  ws_sender (mpsc)│────▶│ Connection Task │
//! └────────────────┘     └──────────────────┘     └────────┬────────┘
//!                                                          │
//!                        ┌──────────────────┐              │
//!                        │ result_tx (mpsc) │◀─────────────┘
//!                        └────────┬─────────┘
//!                                 │
//!                        ┌────────▼─────────┐
//!                        │ Result Forward   │────▶ on_result callback
//!                        │      Task        │
//!                        └──────────────────┘
//! ```
//!
//! `stop()` sends the empty end-of-audio frame, lets the connection task
//! read the remaining results until the service reports `turn.end`, and
//! then waits for both forwarding tasks to run dry. Only after that does it
//! return, so no callback fires for a turn the caller has already closed.

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval, timeout, timeout_at};
use tokio_tungstenite::tungstenite::handshake::client::generate_key;
use tokio_tungstenite::tungstenite::http::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};
use url::Url;

use super::config::AzureSTTConfig;
use super::messages::AzureMessage;
use crate::core::providers::azure::{
    AZURE_CONNECTION_ID_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER, generate_connection_id,
};
use crate::core::stt::base::{BaseSTT, STTError, STTErrorCallback, STTResult, STTResultCallback};

/// Largest audio chunk accepted by `write_chunk`.
///
/// At 48kHz mono 16-bit PCM this is about 2.7 seconds of audio.
pub const MAX_AUDIO_CHUNK_SIZE: usize = 256 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Silence after which a keep-alive frame is sent
const KEEPALIVE_AFTER: Duration = Duration::from_secs(5);

/// 32 samples of 16-bit silence
const KEEPALIVE_FRAME_SIZE: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Streaming,
    Stopped,
}

/// What the connection loop does after a service message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageFlow {
    Continue,
    /// The service finished the session (`turn.end` or a normal close)
    Finished,
}

/// One Azure Speech recognition session.
///
/// Created through [`super::AzureSTTFactory`] once per turn.
pub struct AzureSTT {
    config: AzureSTTConfig,
    state: SessionState,
    connection_id: String,

    /// Bounded (32) so a stalled connection pushes back on the writer
    ws_sender: Option<mpsc::Sender<Bytes>>,
    shutdown_tx: Option<oneshot::Sender<()>>,

    connection_handle: Option<JoinHandle<()>>,
    result_forward_handle: Option<JoinHandle<()>>,
    error_forward_handle: Option<JoinHandle<()>>,

    result_callback: Arc<Mutex<Option<STTResultCallback>>>,
    error_callback: Arc<Mutex<Option<STTErrorCallback>>>,

    /// Cleared by the connection task when it exits
    is_connected: Arc<AtomicBool>,
}

impl AzureSTT {
    pub fn new(config: AzureSTTConfig) -> Result<Self, STTError> {
        config.validate().map_err(STTError::ConfigurationError)?;

        Ok(Self {
            config,
            state: SessionState::Idle,
            connection_id: generate_connection_id(),
            ws_sender: None,
            shutdown_tx: None,
            connection_handle: None,
            result_forward_handle: None,
            error_forward_handle: None,
            result_callback: Arc::new(Mutex::new(None)),
            error_callback: Arc::new(Mutex::new(None)),
            is_connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Connection id sent in `X-ConnectionId`, useful when reading Azure logs
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn config(&self) -> &AzureSTTConfig {
        &self.config
    }

    fn build_request(&self) -> Result<Request<()>, STTError> {
        let ws_url = self.config.build_websocket_url();
        let url = Url::parse(&ws_url).map_err(|e| {
            STTError::ConfigurationError(format!("Invalid Azure STT URL '{ws_url}': {e}"))
        })?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(STTError::ConfigurationError(format!(
                    "Azure STT URL has no host: {ws_url}"
                )));
            }
        };

        Request::builder()
            .method("GET")
            .uri(ws_url.as_str())
            .header("Host", host)
            .header("Upgrade", "websocket")
            .header("Connection", "upgrade")
            .header("Sec-WebSocket-Key", generate_key())
            .header("Sec-WebSocket-Version", "13")
            .header(AZURE_SUBSCRIPTION_KEY_HEADER, self.config.base.api_key.as_str())
            .header(AZURE_CONNECTION_ID_HEADER, self.connection_id.as_str())
            .header("Content-Type", self.config.content_type())
            .body(())
            .map_err(|e| {
                STTError::ConnectionFailed(format!("Failed to create WebSocket request: {e}"))
            })
    }

    /// Route one service message.
    ///
    /// Results are awaited into the channel rather than dropped when it is
    /// full, so every recognized phrase reaches the callback.
    pub(crate) async fn handle_websocket_message(
        message: Message,
        result_tx: &mpsc::Sender<STTResult>,
    ) -> Result<MessageFlow, STTError> {
        match message {
            Message::Text(text) => {
                debug!("Received Azure message: {}", text.as_str());

                match AzureMessage::parse(&text) {
                    Ok(AzureMessage::SpeechHypothesis(hypothesis)) => {
                        if let Some(result) = hypothesis.to_stt_result()
                            && result_tx.send(result).await.is_err()
                        {
                            warn!("Failed to forward hypothesis - channel closed");
                        }
                    }
                    Ok(AzureMessage::SpeechPhrase(phrase)) => {
                        if phrase.recognition_status.is_error() {
                            return Err(STTError::ProviderError(format!(
                                "Azure recognition failed with status {:?}",
                                phrase.recognition_status
                            )));
                        }
                        match phrase.to_stt_result() {
                            Some(result) => {
                                if result_tx.send(result).await.is_err() {
                                    warn!("Failed to forward phrase - channel closed");
                                }
                            }
                            None => debug!(
                                "Phrase without text (status {:?})",
                                phrase.recognition_status
                            ),
                        }
                    }
                    Ok(AzureMessage::TurnEnd) => {
                        debug!("Azure recognition turn ended");
                        return Ok(MessageFlow::Finished);
                    }
                    Ok(AzureMessage::TurnStart) => debug!("Azure recognition turn started"),
                    Ok(AzureMessage::SpeechStartDetected) => debug!("Speech start detected"),
                    Ok(AzureMessage::SpeechEndDetected) => debug!("Speech end detected"),
                    Ok(AzureMessage::Unknown(raw)) => {
                        debug!("Ignoring unknown Azure message: {}", raw);
                    }
                    Err(e) => warn!("Failed to parse Azure message: {}", e),
                }
            }

            Message::Close(frame) => {
                info!("Azure WebSocket closed: {:?}", frame);
                if let Some(frame) = frame
                    && frame.code != CloseCode::Normal
                {
                    return Err(STTError::ProviderError(format!(
                        "Azure closed the session ({}): {}",
                        u16::from(frame.code),
                        frame.reason.as_str()
                    )));
                }
                return Ok(MessageFlow::Finished);
            }

            Message::Binary(data) => {
                debug!("Ignoring binary message from Azure: {} bytes", data.len());
            }

            _ => {}
        }

        Ok(MessageFlow::Continue)
    }

    /// Connection task: stream audio out and results in until shutdown or
    /// until the service ends the session.
    async fn run_connection(
        ws_stream: WsStream,
        mut ws_rx: mpsc::Receiver<Bytes>,
        mut shutdown_rx: oneshot::Receiver<()>,
        result_tx: mpsc::Sender<STTResult>,
        error_tx: mpsc::Sender<STTError>,
        is_connected: Arc<AtomicBool>,
        drain_timeout: Duration,
    ) {
        let (mut ws_sink, mut ws_source) = ws_stream.split();
        let mut keepalive_timer = interval(Duration::from_secs(1));
        let mut last_audio_time = Instant::now();

        loop {
            tokio::select! {
                // Queued audio always goes out before the end-of-audio frame
                biased;

                Some(audio_data) = ws_rx.recv() => {
                    let data_len = audio_data.len();
                    if let Err(e) = ws_sink.send(Message::Binary(audio_data)).await {
                        let stt_error = STTError::NetworkError(format!(
                            "Failed to send audio to Azure: {e}"
                        ));
                        error!("{}", stt_error);
                        let _ = error_tx.try_send(stt_error);
                        break;
                    }
                    debug!("Sent {} bytes of audio to Azure", data_len);
                    last_audio_time = Instant::now();
                }

                _ = &mut shutdown_rx => {
                    info!("Closing Azure STT audio input");
                    Self::finish_session(
                        &mut ws_sink,
                        &mut ws_source,
                        &result_tx,
                        &error_tx,
                        drain_timeout,
                    )
                    .await;
                    break;
                }

                message = ws_source.next() => {
                    match message {
                        Some(Ok(msg)) => match Self::handle_websocket_message(msg, &result_tx).await {
                            Ok(MessageFlow::Continue) => {}
                            Ok(MessageFlow::Finished) => {
                                info!("Azure ended the recognition session");
                                break;
                            }
                            Err(e) => {
                                error!("Azure streaming error: {}", e);
                                let _ = error_tx.try_send(e);
                                break;
                            }
                        },
                        Some(Err(e)) => {
                            let stt_error = STTError::NetworkError(format!("WebSocket error: {e}"));
                            error!("{}", stt_error);
                            let _ = error_tx.try_send(stt_error);
                            break;
                        }
                        None => {
                            let stt_error = STTError::NetworkError(
                                "Azure WebSocket stream ended unexpectedly".to_string(),
                            );
                            warn!("{}", stt_error);
                            let _ = error_tx.try_send(stt_error);
                            break;
                        }
                    }
                }

                _ = keepalive_timer.tick() => {
                    if last_audio_time.elapsed() >= KEEPALIVE_AFTER {
                        let silence = Bytes::from(vec![0u8; KEEPALIVE_FRAME_SIZE]);
                        if let Err(e) = ws_sink.send(Message::Binary(silence)).await {
                            let stt_error = STTError::NetworkError(format!(
                                "Failed to send keep-alive: {e}"
                            ));
                            error!("{}", stt_error);
                            let _ = error_tx.try_send(stt_error);
                            break;
                        }
                        debug!("Sent keep-alive silence frame to Azure");
                        last_audio_time = Instant::now();
                    }
                }
            }
        }

        is_connected.store(false, Ordering::Release);
        info!("Azure STT WebSocket connection closed");
    }

    /// Send end-of-audio and read until the service finishes the session.
    async fn finish_session(
        ws_sink: &mut WsSink,
        ws_source: &mut WsSource,
        result_tx: &mpsc::Sender<STTResult>,
        error_tx: &mpsc::Sender<STTError>,
        drain_timeout: Duration,
    ) {
        // An empty binary frame marks the end of the audio stream
        if let Err(e) = ws_sink.send(Message::Binary(Bytes::new())).await {
            warn!("Failed to send end-of-audio to Azure: {}", e);
            return;
        }

        let drained = timeout(drain_timeout, async {
            while let Some(message) = ws_source.next().await {
                match message {
                    Ok(msg) => match Self::handle_websocket_message(msg, result_tx).await {
                        Ok(MessageFlow::Continue) => {}
                        Ok(MessageFlow::Finished) => break,
                        Err(e) => {
                            error!("Azure streaming error during stop: {}", e);
                            let _ = error_tx.try_send(e);
                            break;
                        }
                    },
                    Err(e) => {
                        let _ = error_tx
                            .try_send(STTError::NetworkError(format!("WebSocket error: {e}")));
                        break;
                    }
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "Azure did not finish the recognition session within {:?}",
                drain_timeout
            );
        }

        let _ = ws_sink.send(Message::Close(None)).await;
    }

    /// Await a task until `deadline`, aborting it if it is still running.
    async fn join_until(mut handle: JoinHandle<()>, deadline: Instant, task: &str) {
        if timeout_at(deadline, &mut handle).await.is_err() {
            warn!("Azure STT {} task did not finish in time, aborting", task);
            handle.abort();
        }
    }
}

fn map_connect_error(e: tungstenite::Error) -> STTError {
    match &e {
        tungstenite::Error::Http(response)
            if matches!(response.status().as_u16(), 401 | 403) =>
        {
            STTError::AuthenticationFailed(format!(
                "Azure Speech rejected the subscription key (HTTP {})",
                response.status()
            ))
        }
        _ => STTError::ConnectionFailed(format!("Failed to connect to Azure Speech: {e}")),
    }
}

/// Dropping an open recognizer abandons the session: the connection task is
/// aborted, which closes the Azure socket without sending end-of-audio, and
/// no further callbacks run. Use `stop()` to collect the final results.
impl Drop for AzureSTT {
    fn drop(&mut self) {
        // Abort before the shutdown sender is dropped, which would start a drain
        let handles = [
            self.connection_handle.take(),
            self.result_forward_handle.take(),
            self.error_forward_handle.take(),
        ];
        let mut aborted = false;
        for handle in handles.into_iter().flatten() {
            handle.abort();
            aborted = true;
        }

        if aborted {
            self.is_connected.store(false, Ordering::Release);
            info!(
                "Azure STT session abandoned (connection_id: {})",
                self.connection_id
            );
        }
    }
}

#[async_trait::async_trait]
impl BaseSTT for AzureSTT {
    async fn start(&mut self) -> Result<(), STTError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Streaming => {
                return Err(STTError::ConnectionFailed(
                    "Recognition session already started".to_string(),
                ));
            }
            SessionState::Stopped => {
                return Err(STTError::ConnectionFailed(
                    "Recognition session already finished".to_string(),
                ));
            }
        }

        let request = self.build_request()?;
        info!(
            "Connecting to Azure Speech-to-Text (connection_id: {}, language: {}, sample_rate: {})",
            self.connection_id, self.config.base.language, self.config.base.sample_rate
        );

        let ws_stream = match timeout(CONNECT_TIMEOUT, connect_async(request)).await {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => {
                let stt_error = map_connect_error(e);
                error!("{}", stt_error);
                return Err(stt_error);
            }
            Err(_) => {
                return Err(STTError::ConnectionFailed(format!(
                    "Timed out after {}s connecting to Azure Speech",
                    CONNECT_TIMEOUT.as_secs()
                )));
            }
        };

        info!(
            "Connected to Azure Speech-to-Text WebSocket (connection_id: {})",
            self.connection_id
        );

        let (ws_tx, ws_rx) = mpsc::channel::<Bytes>(32);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (result_tx, mut result_rx) = mpsc::channel::<STTResult>(256);
        let (error_tx, mut error_rx) = mpsc::channel::<STTError>(64);

        self.ws_sender = Some(ws_tx);
        self.shutdown_tx = Some(shutdown_tx);
        self.is_connected.store(true, Ordering::Release);

        // Leave part of the stop budget for the forwarding tasks
        let drain_timeout = self.config.stop_timeout.mul_f32(0.8);

        self.connection_handle = Some(tokio::spawn(Self::run_connection(
            ws_stream,
            ws_rx,
            shutdown_rx,
            result_tx,
            error_tx,
            self.is_connected.clone(),
            drain_timeout,
        )));

        let callback_ref = self.result_callback.clone();
        self.result_forward_handle = Some(tokio::spawn(async move {
            while let Some(result) = result_rx.recv().await {
                if let Some(callback) = callback_ref.lock().await.as_ref() {
                    callback(result).await;
                } else {
                    debug!(
                        "Azure STT result (no callback): {} (final: {})",
                        result.transcript, result.is_final
                    );
                }
            }
        }));

        let error_callback_ref = self.error_callback.clone();
        self.error_forward_handle = Some(tokio::spawn(async move {
            while let Some(error) = error_rx.recv().await {
                if let Some(callback) = error_callback_ref.lock().await.as_ref() {
                    callback(error).await;
                } else {
                    error!("Azure STT error (no callback registered): {}", error);
                }
            }
        }));

        self.state = SessionState::Streaming;
        Ok(())
    }

    async fn write_chunk(&mut self, audio: Bytes) -> Result<(), STTError> {
        if self.state != SessionState::Streaming || !self.is_ready() {
            return Err(STTError::NotConnected);
        }

        if audio.len() > MAX_AUDIO_CHUNK_SIZE {
            return Err(STTError::InvalidAudioFormat(format!(
                "Audio chunk size {} bytes exceeds maximum {} bytes",
                audio.len(),
                MAX_AUDIO_CHUNK_SIZE
            )));
        }

        // Empty frames would end the audio stream early
        if audio.is_empty() {
            return Ok(());
        }

        let sender = self.ws_sender.as_ref().ok_or(STTError::NotConnected)?;
        sender
            .send(audio)
            .await
            .map_err(|_| STTError::NotConnected)
    }

    async fn stop(&mut self) -> Result<(), STTError> {
        if self.state != SessionState::Streaming {
            return Ok(());
        }
        self.state = SessionState::Stopped;

        let deadline = Instant::now() + self.config.stop_timeout;

        self.ws_sender = None;
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        // The connection task owns the only result and error senders, so the
        // forwarding tasks end once it has exited and their queues are empty.
        if let Some(handle) = self.connection_handle.take() {
            Self::join_until(handle, deadline, "connection").await;
        }
        if let Some(handle) = self.result_forward_handle.take() {
            Self::join_until(handle, deadline, "result forwarding").await;
        }
        if let Some(handle) = self.error_forward_handle.take() {
            Self::join_until(handle, deadline, "error forwarding").await;
        }

        self.is_connected.store(false, Ordering::Release);
        info!(
            "Azure STT session stopped (connection_id: {})",
            self.connection_id
        );
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.is_connected.load(Ordering::Acquire) && self.ws_sender.is_some()
    }

    async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError> {
        *self.result_callback.lock().await = Some(callback);
        Ok(())
    }

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError> {
        *self.error_callback.lock().await = Some(callback);
        Ok(())
    }

    fn get_provider_info(&self) -> &'static str {
        "Azure Speech-to-Text WebSocket"
    }
}
