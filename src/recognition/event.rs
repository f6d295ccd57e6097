//! Recognition event types shared by the source, the dispatcher, and
//! modal sessions

use serde::{Deserialize, Serialize};

/// One utterance transcription result as reported by the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEvent {
    /// Transcribed text. May be empty even when recognition succeeded.
    pub text: String,
    /// Whether the recognizer considers this a usable result.
    pub success: bool,
    /// Raw result code from the recognizer, kept for diagnostics.
    #[serde(default)]
    pub result_code: i32,
}

impl RecognitionEvent {
    /// Successful transcription of `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            result_code: 0,
        }
    }

    /// Failed recognition attempt carrying the recognizer's result code.
    pub fn failure(result_code: i32) -> Self {
        Self {
            text: String::new(),
            success: false,
            result_code,
        }
    }

    /// Lower-cased, trimmed text used for phrase matching.
    pub fn normalized_text(&self) -> String {
        normalize(&self.text)
    }
}

/// Normalization applied to trigger phrases and recognized text alike.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
