//! In-process provider doubles
//!
//! - [`ScriptedSTTFactory`] hands out recognizers that emit a partial for
//!   every chunk and a scripted list of finals when they are stopped
//! - [`MockLLM`] answers with a canned reply or a configured error
//! - [`MockTTS`] returns a fixed audio buffer or a configured error

// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use voice_relay::ServerConfig;
use voice_relay::core::llm::{BaseLLM, LLMError};
use voice_relay::core::stt::{
    BaseSTT, STTError, STTErrorCallback, STTFactory, STTResult, STTResultCallback,
};
use voice_relay::core::tts::{BaseTTS, TTSError, TTSResult};
use voice_relay::state::AppState;

/// Shared record of what the recognizers saw
#[derive(Default)]
pub struct SttLog {
    pub created: AtomicUsize,
    pub stopped: AtomicUsize,
    /// Recognizer handles released, stopped or not
    pub dropped: AtomicUsize,
    pub sample_rates: std::sync::Mutex<Vec<u32>>,
    pub chunks: Mutex<Vec<Bytes>>,
}

impl SttLog {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub async fn chunk_count(&self) -> usize {
        self.chunks.lock().await.len()
    }
}

pub struct ScriptedSTTFactory {
    /// Final transcripts delivered on `stop`, only when audio was written
    pub finals: Vec<String>,
    pub fail_start: bool,
    /// Error reported through the error callback on `stop`
    pub cancel_with: Option<STTError>,
    pub log: Arc<SttLog>,
}

impl ScriptedSTTFactory {
    pub fn with_finals(finals: &[&str]) -> Self {
        Self {
            finals: finals.iter().map(|s| s.to_string()).collect(),
            fail_start: false,
            cancel_with: None,
            log: Arc::new(SttLog::default()),
        }
    }
}

impl STTFactory for ScriptedSTTFactory {
    fn create(&self, sample_rate: u32) -> Result<Box<dyn BaseSTT>, STTError> {
        self.log.created.fetch_add(1, Ordering::SeqCst);
        self.log.sample_rates.lock().unwrap().push(sample_rate);
        Ok(Box::new(ScriptedSTT {
            finals: self.finals.clone(),
            fail_start: self.fail_start,
            cancel_with: self.cancel_with.clone(),
            log: self.log.clone(),
            started: false,
            stopped: false,
            wrote_audio: false,
            result_callback: None,
            error_callback: None,
        }))
    }
}

pub struct ScriptedSTT {
    finals: Vec<String>,
    fail_start: bool,
    cancel_with: Option<STTError>,
    log: Arc<SttLog>,
    started: bool,
    stopped: bool,
    wrote_audio: bool,
    result_callback: Option<STTResultCallback>,
    error_callback: Option<STTErrorCallback>,
}

#[async_trait]
impl BaseSTT for ScriptedSTT {
    async fn start(&mut self) -> Result<(), STTError> {
        if self.fail_start {
            return Err(STTError::AuthenticationFailed("HTTP 401".to_string()));
        }
        self.started = true;
        Ok(())
    }

    async fn write_chunk(&mut self, audio: Bytes) -> Result<(), STTError> {
        if !self.is_ready() {
            return Err(STTError::NotConnected);
        }
        let index = {
            let mut chunks = self.log.chunks.lock().await;
            chunks.push(audio);
            chunks.len()
        };
        self.wrote_audio = true;
        if let Some(callback) = &self.result_callback {
            callback(STTResult::new(format!("partial {index}"), false, 0.0)).await;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), STTError> {
        if !self.started || self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.log.stopped.fetch_add(1, Ordering::SeqCst);

        if let (Some(err), Some(callback)) = (self.cancel_with.clone(), &self.error_callback) {
            callback(err).await;
        }
        if self.wrote_audio
            && let Some(callback) = &self.result_callback
        {
            for text in &self.finals {
                callback(STTResult::new(text.clone(), true, 0.9)).await;
            }
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.started && !self.stopped
    }

    async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError> {
        self.result_callback = Some(callback);
        Ok(())
    }

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError> {
        self.error_callback = Some(callback);
        Ok(())
    }

    fn get_provider_info(&self) -> &'static str {
        "scripted"
    }
}

impl Drop for ScriptedSTT {
    fn drop(&mut self) {
        self.log.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockLLM {
    pub reply: Result<String, LLMError>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockLLM {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: LLMError) -> Self {
        Self {
            reply: Err(err),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BaseLLM for MockLLM {
    async fn generate(&self, transcript: &str) -> Result<String, LLMError> {
        self.prompts.lock().await.push(transcript.to_string());
        self.reply.clone()
    }

    fn get_provider_info(&self) -> &'static str {
        "mock-llm"
    }
}

pub struct MockTTS {
    pub audio: Result<Bytes, TTSError>,
    pub texts: Mutex<Vec<String>>,
}

impl MockTTS {
    pub fn with_audio(len: usize) -> Self {
        Self {
            audio: Ok((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into()),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: TTSError) -> Self {
        Self {
            audio: Err(err),
            texts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BaseTTS for MockTTS {
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        self.texts.lock().await.push(text.to_string());
        self.audio.clone()
    }

    fn get_provider_info(&self) -> &'static str {
        "mock-tts"
    }
}

pub fn app_state(
    stt: Arc<ScriptedSTTFactory>,
    llm: Arc<MockLLM>,
    tts: Arc<MockTTS>,
    chunk_size: usize,
) -> Arc<AppState> {
    let mut config = ServerConfig::default();
    config.tts_chunk_size = chunk_size;
    AppState::with_providers(config, stt, llm, tts)
}
