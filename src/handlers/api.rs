use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::stt::{STTError, STTFactory, STTResult};
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field that carries the WAV upload
const UPLOAD_FIELD: &str = "file";

/// Health check handler
/// Returns a simple JSON response indicating the server is running
pub async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "ok"
    })))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RecognitionInfo {
    pub reason: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RecognizeOnceResponse {
    pub text: String,
    pub info: RecognitionInfo,
}

impl RecognizeOnceResponse {
    fn from_transcript(transcript: Option<String>) -> Self {
        match transcript {
            Some(text) => Self {
                text,
                info: RecognitionInfo {
                    reason: "RecognizedSpeech",
                },
            },
            None => Self {
                text: String::new(),
                info: RecognitionInfo { reason: "NoMatch" },
            },
        }
    }
}

/// 16-bit mono PCM decoded from a WAV upload
#[derive(Debug, PartialEq)]
pub struct PcmClip {
    pub sample_rate: u32,
    pub pcm: Bytes,
}

/// Decode a WAV file into little-endian 16-bit mono PCM.
///
/// Multi-channel audio is down-mixed by averaging the channels of each
/// frame. Anything other than 16-bit integer samples is rejected.
pub fn decode_wav(data: &[u8]) -> Result<PcmClip, String> {
    let reader =
        hound::WavReader::new(Cursor::new(data)).map_err(|e| format!("Invalid WAV file: {e}"))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(format!(
            "WAV must be 16-bit PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        ));
    }
    if spec.channels == 0 {
        return Err("WAV declares no channels".to_string());
    }

    let samples: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to read WAV samples: {e}"))?;

    let channels = usize::from(spec.channels);
    let mut pcm = Vec::with_capacity(samples.len() / channels * 2);
    for frame in samples.chunks(channels) {
        let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
        // The average of i16 values always fits in i16.
        let mixed = (sum / frame.len() as i32) as i16;
        pcm.extend_from_slice(&mixed.to_le_bytes());
    }

    Ok(PcmClip {
        sample_rate: spec.sample_rate,
        pcm: pcm.into(),
    })
}

/// Run one complete recognition turn over a PCM clip.
///
/// Audio is written in 100 ms slices. Returns the last final transcript,
/// `None` when nothing was recognized, or the first error the recognizer
/// reported.
pub async fn recognize_clip(
    factory: &dyn STTFactory,
    clip: PcmClip,
) -> Result<Option<String>, STTError> {
    let mut stt = factory.create(clip.sample_rate)?;

    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<STTResult>();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<STTError>();

    stt.on_result(Arc::new(move |result: STTResult| {
        let _ = result_tx.send(result);
        Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
    }))
    .await?;
    stt.on_error(Arc::new(move |err: STTError| {
        let _ = error_tx.send(err);
        Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
    }))
    .await?;

    stt.start().await?;

    let slice_len = (clip.sample_rate as usize / 10 * 2).max(2);
    let mut offset = 0;
    while offset < clip.pcm.len() {
        let end = clip.pcm.len().min(offset + slice_len);
        match stt.write_chunk(clip.pcm.slice(offset..end)).await {
            Ok(()) => {}
            // Session already ended on the service side; its error arrives below.
            Err(STTError::NotConnected) => break,
            Err(e) => return Err(e),
        }
        offset = end;
    }

    stt.stop().await?;

    let mut transcript = None;
    while let Ok(result) = result_rx.try_recv() {
        if result.is_final {
            transcript = Some(result.transcript);
        }
    }
    if transcript.is_none()
        && let Ok(err) = error_rx.try_recv()
    {
        return Err(err);
    }

    Ok(transcript)
}

/// `POST /stt/recognize_once`
///
/// Transcribes one uploaded WAV clip (multipart field `file`) with the same
/// recognizer the WebSocket sessions use.
pub async fn recognize_once(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<RecognizeOnceResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
            upload = Some(data);
            break;
        }
    }

    let data = upload.ok_or_else(|| {
        AppError::BadRequest(format!("Missing multipart field '{UPLOAD_FIELD}'"))
    })?;
    debug!("recognize_once upload: {} bytes", data.len());

    let clip = decode_wav(&data).map_err(AppError::BadRequest)?;
    info!(
        "Recognizing {} ms of audio at {} Hz",
        clip.pcm.len() as u64 * 1000 / (u64::from(clip.sample_rate).max(1) * 2),
        clip.sample_rate
    );

    let transcript = recognize_clip(state.stt_factory.as_ref(), clip)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(RecognizeOnceResponse::from_transcript(transcript)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(channels: u16, bits: u16, frames: &[Vec<i32>]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for frame in frames {
                for &sample in frame {
                    if bits == 16 {
                        writer.write_sample(sample as i16).unwrap();
                    } else {
                        writer.write_sample(sample).unwrap();
                    }
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[tokio::test]
    async fn test_health_check() {
        let Json(body) = health_check().await.unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[test]
    fn test_decode_mono_wav() {
        let data = wav_bytes(1, 16, &[vec![1], vec![-2], vec![300]]);
        let clip = decode_wav(&data).unwrap();

        assert_eq!(clip.sample_rate, 16000);
        let expected: Vec<u8> = [1i16, -2, 300]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        assert_eq!(clip.pcm.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        let data = wav_bytes(2, 16, &[vec![100, 300], vec![-1000, 1000], vec![32767, 32767]]);
        let clip = decode_wav(&data).unwrap();

        let expected: Vec<u8> = [200i16, 0, 32767]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        assert_eq!(clip.pcm.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_decode_rejects_other_formats() {
        let data = wav_bytes(1, 24, &[vec![1], vec![2]]);
        let err = decode_wav(&data).unwrap_err();
        assert!(err.contains("16-bit PCM"));

        assert!(decode_wav(b"definitely not a wav").is_err());
    }

    #[test]
    fn test_response_shape() {
        let found = RecognizeOnceResponse::from_transcript(Some("مرحبا".to_string()));
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            json!({"text": "مرحبا", "info": {"reason": "RecognizedSpeech"}})
        );

        let missing = RecognizeOnceResponse::from_transcript(None);
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            json!({"text": "", "info": {"reason": "NoMatch"}})
        );
    }
}
