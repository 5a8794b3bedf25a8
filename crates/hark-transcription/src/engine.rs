//! The `SpeechEngine` trait and an in-crate test double.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::{Transcription, TranscriptionError};

/// Opaque transcription capability bound to a model artifact and an
/// execution device at load time.
///
/// Implementations must be safe for concurrent read-only use: the
/// request transformer never mutates the engine, and the hosting
/// runtime may run many requests against one instance.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Transcribe the media file at `path`.
    ///
    /// Blocking inference work is expected to run on a blocking thread
    /// pool inside the implementation, not on the async executor.
    async fn transcribe(&self, path: &Path) -> Result<Transcription, TranscriptionError>;
}

/// Scripted engine for tests.
///
/// Returns a canned [`Transcription`] and records, per call, the path
/// it was invoked with and the bytes that file held at call time (the
/// staged file is deleted once the request scope ends, so capture has
/// to happen inside the call).
pub struct StaticEngine {
    result: Transcription,
    calls: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl StaticEngine {
    /// Create an engine that always returns `result`.
    pub fn new(result: Transcription) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Paths and file contents captured from each `transcribe` call.
    pub fn captured(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl SpeechEngine for StaticEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcription, TranscriptionError> {
        let bytes = std::fs::read(path)?;
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((path.to_path_buf(), bytes));
        Ok(self.result.clone())
    }
}

/// Engine that always fails, for error-path tests.
pub struct FailingEngine;

#[async_trait]
impl SpeechEngine for FailingEngine {
    async fn transcribe(&self, _path: &Path) -> Result<Transcription, TranscriptionError> {
        Err(TranscriptionError::Inference("scripted failure".into()))
    }
}
