//! Per-connection voice session
//!
//! The session owns at most one recognizer handle. `audio_start` opens it,
//! `audio_end` closes it and runs the turn: generate a reply for the last
//! final transcript, synthesize it and stream the audio back in slices.
//!
//! Recognition callbacks never touch the session directly. They push
//! [`TranscriptEvent`]s into an unbounded channel that the connection loop
//! reads through [`VoiceSession::next_transcript`]. After `stop()` returns
//! every event of the turn is already queued, so `audio_end` drains the
//! channel with `try_recv` before looking at the transcript.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::llm::{self, BaseLLM};
use crate::core::stt::{BaseSTT, STTError, STTFactory, STTResult};
use crate::core::tts::{self, BaseTTS};
use crate::state::AppState;

use super::error::{WebSocketError, WebSocketResult};
use super::messages::{IncomingMessage, MessageRoute, OutgoingMessage};

/// Transcript delivered by the recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    Partial(String),
    Final(String),
}

impl From<STTResult> for TranscriptEvent {
    fn from(result: STTResult) -> Self {
        if result.is_final {
            Self::Final(result.transcript)
        } else {
            Self::Partial(result.transcript)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
}

pub struct VoiceSession {
    stt_factory: Arc<dyn STTFactory>,
    llm: Arc<dyn BaseLLM>,
    tts: Arc<dyn BaseTTS>,
    chunk_size: usize,
    message_tx: mpsc::Sender<MessageRoute>,
    transcript_tx: mpsc::UnboundedSender<TranscriptEvent>,
    transcript_rx: mpsc::UnboundedReceiver<TranscriptEvent>,
    recognizer: Option<Box<dyn BaseSTT>>,
    /// Last final transcript of the current turn
    transcript: String,
}

impl VoiceSession {
    pub fn new(app_state: &AppState, message_tx: mpsc::Sender<MessageRoute>) -> Self {
        let (transcript_tx, transcript_rx) = mpsc::unbounded_channel();
        Self {
            stt_factory: app_state.stt_factory.clone(),
            llm: app_state.llm.clone(),
            tts: app_state.tts.clone(),
            chunk_size: app_state.config.tts_chunk_size,
            message_tx,
            transcript_tx,
            transcript_rx,
            recognizer: None,
            transcript: String::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.recognizer.is_some() {
            SessionState::Listening
        } else {
            SessionState::Idle
        }
    }

    /// Accumulated final transcript of the current turn
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub async fn handle_message(&mut self, message: IncomingMessage) {
        match message {
            IncomingMessage::AudioStart { sample_rate } => self.start_turn(sample_rate).await,
            IncomingMessage::AudioChunkB64(data) => self.feed_audio_b64(&data).await,
            IncomingMessage::AudioChunk(data) => self.feed_audio(data).await,
            IncomingMessage::AudioEnd => self.end_turn().await,
        }
    }

    /// Wait for the next transcript event from the recognizer.
    ///
    /// Pending forever while no recognizer is running, which keeps the
    /// branch quiet inside the connection `select!`.
    pub async fn next_transcript(&mut self) -> Option<TranscriptEvent> {
        self.transcript_rx.recv().await
    }

    /// Forward a transcript event to the client and keep the final text.
    pub async fn forward_transcript(&mut self, event: TranscriptEvent) {
        if let TranscriptEvent::Final(text) = &event {
            self.transcript.clone_from(text);
        }
        self.send_transcript(event).await;
    }

    async fn send_transcript(&self, event: TranscriptEvent) {
        let message = match event {
            TranscriptEvent::Partial(text) => OutgoingMessage::SttPartial(text),
            TranscriptEvent::Final(text) => OutgoingMessage::SttFinal(text),
        };
        self.send(message).await;
    }

    pub async fn start_turn(&mut self, sample_rate: u32) {
        if self.recognizer.is_some() {
            info!("audio_start while listening, closing the previous recognizer");
            self.stop_recognizer().await;
            // Late events of the abandoned turn still reach the client.
            while let Ok(event) = self.transcript_rx.try_recv() {
                self.send_transcript(event).await;
            }
        }

        self.transcript.clear();

        match self.open_recognizer(sample_rate).await {
            Ok(recognizer) => {
                info!("Turn started ({} Hz)", sample_rate);
                self.recognizer = Some(recognizer);
            }
            Err(e) => {
                error!("Failed to open recognizer: {}", e);
                self.send_error(&e).await;
            }
        }
    }

    async fn open_recognizer(&self, sample_rate: u32) -> WebSocketResult<Box<dyn BaseSTT>> {
        let mut recognizer = self
            .stt_factory
            .create(sample_rate)
            .map_err(WebSocketError::RecognizerStart)?;

        let result_tx = self.transcript_tx.clone();
        recognizer
            .on_result(Arc::new(move |result: STTResult| {
                let _ = result_tx.send(TranscriptEvent::from(result));
                Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
            }))
            .await
            .map_err(WebSocketError::RecognizerStart)?;

        recognizer
            .on_error(Arc::new(|err: STTError| {
                Box::pin(async move {
                    warn!("Recognition cancelled: {}", err);
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            }))
            .await
            .map_err(WebSocketError::RecognizerStart)?;

        recognizer
            .start()
            .await
            .map_err(WebSocketError::RecognizerStart)?;

        Ok(recognizer)
    }

    pub async fn feed_audio_b64(&mut self, data: &str) {
        if self.recognizer.is_none() {
            debug!("Dropping base64 audio chunk received while idle");
            return;
        }
        match BASE64.decode(data.as_bytes()) {
            Ok(audio) => self.feed_audio(Bytes::from(audio)).await,
            Err(e) => {
                warn!("Malformed base64 audio chunk: {}", e);
                self.send_error(&WebSocketError::from(e)).await;
            }
        }
    }

    pub async fn feed_audio(&mut self, audio: Bytes) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            debug!("Dropping {} bytes of audio received while idle", audio.len());
            return;
        };

        debug!("Forwarding {} bytes of audio", audio.len());
        match recognizer.write_chunk(audio).await {
            Ok(()) => {}
            Err(STTError::NotConnected) => {
                debug!("Recognizer no longer accepts audio, chunk dropped");
            }
            Err(e) => {
                warn!("Failed to forward audio: {}", e);
                self.send_error(&WebSocketError::AudioProcessing(e)).await;
            }
        }
    }

    pub async fn end_turn(&mut self) {
        if self.recognizer.is_none() {
            debug!("audio_end without an open turn");
            return;
        }

        self.stop_recognizer().await;
        while let Ok(event) = self.transcript_rx.try_recv() {
            self.forward_transcript(event).await;
        }

        let transcript = self.transcript.trim().to_string();
        if transcript.is_empty() {
            info!("Turn ended without a final transcript");
            return;
        }

        info!("Turn ended, answering {} chars", transcript.chars().count());
        if let Err(e) = self.respond(&transcript).await {
            error!("Turn pipeline failed: {}", e);
            self.send_error(&e).await;
        }
    }

    /// Generate, synthesize and stream the reply for one transcript.
    async fn respond(&self, transcript: &str) -> WebSocketResult<()> {
        let reply = llm::generate(self.llm.as_ref(), transcript).await?;
        self.send(OutgoingMessage::AssistantText(reply.clone()))
            .await;

        let audio = self.tts.synthesize(&reply).await?;
        if audio.is_empty() {
            info!("Synthesis produced no audio");
            return Ok(());
        }

        let chunks = tts::chunk(audio, self.chunk_size);
        debug!(
            "Streaming {} bytes of reply audio in {} chunks",
            chunks.total_len(),
            chunks.len()
        );

        self.send(OutgoingMessage::TtsStart).await;
        for slice in chunks {
            self.send(OutgoingMessage::TtsChunkB64(BASE64.encode(&slice)))
                .await;
        }
        self.send(OutgoingMessage::TtsEnd).await;
        Ok(())
    }

    async fn stop_recognizer(&mut self) {
        if let Some(mut recognizer) = self.recognizer.take()
            && let Err(e) = recognizer.stop().await
        {
            warn!("Failed to stop recognizer: {}", e);
        }
    }

    /// Tear down the session when the connection goes away.
    ///
    /// The recognizer is dropped without waiting for its final results.
    pub fn close(&mut self) {
        if let Some(recognizer) = self.recognizer.take() {
            info!(
                "Closing open {} session on disconnect",
                recognizer.get_provider_info()
            );
            drop(recognizer);
        }
    }

    async fn send(&self, message: OutgoingMessage) {
        if self
            .message_tx
            .send(MessageRoute::Outgoing(message))
            .await
            .is_err()
        {
            debug!("Client gone, outgoing message dropped");
        }
    }

    pub async fn send_error(&self, err: &WebSocketError) {
        self.send(OutgoingMessage::error(err)).await;
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.close();
    }
}
