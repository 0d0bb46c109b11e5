//! Text messages received from the Azure Speech WebSocket.
//!
//! Every service message carries a small header block followed by a JSON
//! body, separated by an empty line:
//!
//! ```text
//! X-RequestId:6f1c...
//! Path:speech.hypothesis
//! Content-Type:application/json; charset=utf-8
//!
//! {"Text":"مرحبا","Offset":1800000,"Duration":5600000}
//! ```
//!
//! The `Path` header selects the message kind.

use serde::Deserialize;

use crate::core::stt::base::STTResult;

const HEADER_SEPARATOR: &str = "\r\n\r\n";

/// Outcome of a recognized phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionStatus {
    Success,
    NoMatch,
    InitialSilenceTimeout,
    BabbleTimeout,
    Error,
    EndOfDictation,
    Other(String),
}

impl RecognitionStatus {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Statuses after which the service will not recognize any more audio
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::BabbleTimeout)
    }
}

impl From<String> for RecognitionStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "Success" => Self::Success,
            "NoMatch" => Self::NoMatch,
            "InitialSilenceTimeout" => Self::InitialSilenceTimeout,
            "BabbleTimeout" => Self::BabbleTimeout,
            "Error" => Self::Error,
            "EndOfDictation" => Self::EndOfDictation,
            _ => Self::Other(status),
        }
    }
}

impl<'de> Deserialize<'de> for RecognitionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NBestEntry {
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub display: String,
}

/// `speech.phrase`: a settled utterance
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpeechPhrase {
    pub recognition_status: RecognitionStatus,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub display_text: Option<String>,
    #[serde(default, rename = "NBest")]
    pub nbest: Option<Vec<NBestEntry>>,
}

impl SpeechPhrase {
    /// Display text of the simple format, else the best detailed alternative
    pub fn transcript(&self) -> Option<&str> {
        if let Some(text) = self.display_text.as_deref() {
            return Some(text);
        }
        self.nbest
            .as_ref()
            .and_then(|nbest| nbest.first())
            .map(|best| best.display.as_str())
    }

    pub fn confidence(&self) -> f32 {
        self.nbest
            .as_ref()
            .and_then(|nbest| nbest.first())
            .map(|best| best.confidence as f32)
            .unwrap_or(1.0)
    }

    /// Final result, only for successful recognition with non-empty text.
    pub fn to_stt_result(&self) -> Option<STTResult> {
        if !self.recognition_status.is_success() {
            return None;
        }
        let transcript = self.transcript()?.trim();
        if transcript.is_empty() {
            return None;
        }
        Some(STTResult::new(
            transcript.to_string(),
            true,
            self.confidence(),
        ))
    }
}

/// `speech.hypothesis`: an interim guess for the utterance in progress
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpeechHypothesis {
    pub text: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub duration: u64,
}

impl SpeechHypothesis {
    pub fn to_stt_result(&self) -> Option<STTResult> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        // Hypotheses carry no score
        Some(STTResult::new(text.to_string(), false, 0.0))
    }
}

#[derive(Debug, Clone)]
pub enum AzureMessage {
    SpeechStartDetected,
    SpeechEndDetected,
    SpeechHypothesis(SpeechHypothesis),
    SpeechPhrase(SpeechPhrase),
    TurnStart,
    /// The service has finished the recognition session
    TurnEnd,
    Unknown(String),
}

impl AzureMessage {
    /// Parse one text frame.
    ///
    /// Frames without a header block are classified by their JSON fields.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let (path, body) = split_message(raw);

        match path.map(str::to_ascii_lowercase).as_deref() {
            Some("speech.hypothesis") | Some("speech.fragment") => {
                Ok(Self::SpeechHypothesis(serde_json::from_str(body)?))
            }
            Some("speech.phrase") => Ok(Self::SpeechPhrase(serde_json::from_str(body)?)),
            Some("speech.startdetected") => Ok(Self::SpeechStartDetected),
            Some("speech.enddetected") => Ok(Self::SpeechEndDetected),
            Some("turn.start") => Ok(Self::TurnStart),
            Some("turn.end") => Ok(Self::TurnEnd),
            Some(_) => Ok(Self::Unknown(raw.to_string())),
            None => Self::parse_body(body, raw),
        }
    }

    fn parse_body(body: &str, raw: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if value.get("RecognitionStatus").is_some() {
            Ok(Self::SpeechPhrase(serde_json::from_value(value)?))
        } else if value.get("Text").is_some() {
            Ok(Self::SpeechHypothesis(serde_json::from_value(value)?))
        } else {
            Ok(Self::Unknown(raw.to_string()))
        }
    }
}

/// Split a frame into its `Path` header value and body.
fn split_message(raw: &str) -> (Option<&str>, &str) {
    let Some((headers, body)) = raw.split_once(HEADER_SEPARATOR) else {
        return (None, raw);
    };

    let path = headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("path")
            .then(|| value.trim())
    });

    (path, body)
}
