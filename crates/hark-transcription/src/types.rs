//! Core types for the speech engine seam.

use serde::{Deserialize, Serialize};

/// Result of transcribing a media file.
///
/// The text field is always present; language and duration are
/// engine-dependent metadata and are omitted from the wire format when
/// the bound engine does not produce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// The transcribed text.
    pub text: String,
    /// Detected language code (e.g. "en"), when the engine reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Duration of the audio in seconds, when the engine reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl Transcription {
    /// A transcription carrying text only, no metadata.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            duration_seconds: None,
        }
    }
}

/// Errors that can occur while loading a model or transcribing.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// Model files not found, incomplete, or failed to download.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// ONNX Runtime session creation or inference failure.
    #[error("inference error: {0}")]
    Inference(String),

    /// Audio decoding failure (unsupported format, corrupt data).
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// I/O error (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extension trait to reduce `.map_err()` boilerplate when wrapping errors into `TranscriptionError`.
pub trait ResultExt<T> {
    /// Wrap the error as [`TranscriptionError::Inference`] with `context` prefix.
    fn inference(self, context: &str) -> Result<T, TranscriptionError>;
    /// Wrap the error as [`TranscriptionError::AudioDecode`] with `context` prefix.
    fn audio_decode(self, context: &str) -> Result<T, TranscriptionError>;
    /// Wrap the error as [`TranscriptionError::ModelNotAvailable`] with `context` prefix.
    fn model(self, context: &str) -> Result<T, TranscriptionError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn inference(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Inference(format!("{context}: {e}")))
    }
    fn audio_decode(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::AudioDecode(format!("{context}: {e}")))
    }
    fn model(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::ModelNotAvailable(format!("{context}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_transcription_has_no_metadata() {
        let t = Transcription::plain("hello");
        assert_eq!(t.text, "hello");
        assert!(t.language.is_none());
        assert!(t.duration_seconds.is_none());
    }

    #[test]
    fn plain_transcription_serializes_text_only() {
        let t = Transcription::plain("hello world");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"text":"hello world"}"#);
    }

    #[test]
    fn full_transcription_round_trips() {
        let t = Transcription {
            text: "Hello world".into(),
            language: Some("en".into()),
            duration_seconds: Some(2.5),
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: Transcription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn transcription_error_display() {
        let e = TranscriptionError::ModelNotAvailable("missing encoder".into());
        assert!(e.to_string().contains("missing encoder"));

        let e = TranscriptionError::AudioDecode("corrupt header".into());
        assert!(e.to_string().contains("corrupt header"));
    }

    #[test]
    fn result_ext_inference_context() {
        let err: Result<(), &str> = Err("onnx failure");
        let mapped = err.inference("encoder run");
        assert!(
            matches!(mapped, Err(TranscriptionError::Inference(s)) if s == "encoder run: onnx failure")
        );
    }

    #[test]
    fn result_ext_model_context() {
        let err: Result<(), &str> = Err("download failed");
        let mapped = err.model("ensure_model");
        assert!(
            matches!(mapped, Err(TranscriptionError::ModelNotAvailable(s)) if s == "ensure_model: download failed")
        );
    }

    #[test]
    fn result_ext_ok_passthrough() {
        let ok: Result<i32, &str> = Ok(42);
        assert_eq!(ok.inference("ctx").unwrap(), 42);
        let ok: Result<i32, &str> = Ok(99);
        assert_eq!(ok.audio_decode("ctx").unwrap(), 99);
    }

    #[test]
    fn error_from_io_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TranscriptionError = io.into();
        assert!(matches!(err, TranscriptionError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
