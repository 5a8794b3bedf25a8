//! Model-specific single-pass adapter (feature-gated behind `ort`).
//!
//! Runs the whole clip through the encoder in one call and reports a
//! richer result (text plus language and audio duration). This is the
//! "model-specific" variant of the engine seam.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::audio::{ctc_collapse, decode_media, TARGET_SAMPLE_RATE};
use crate::device::Device;
use crate::engine::SpeechEngine;
use crate::model::{load_vocab, ModelPaths};
use crate::pipeline::{build_session, run_encoder};
use crate::types::{ResultExt, Transcription, TranscriptionError};

/// Language code the bundled model is trained on.
const MODEL_LANGUAGE: &str = "en";

/// Single-pass whisper-style engine.
pub struct WhisperEngine {
    session: Arc<Mutex<ort::session::Session>>,
    vocab: Arc<Vec<String>>,
}

impl WhisperEngine {
    /// Load the engine from artifacts under `model_dir`, bound to `device`.
    pub fn load(model_dir: &Path, device: Device) -> Result<Self, TranscriptionError> {
        let paths = ModelPaths::from_dir(model_dir);
        if !paths.all_exist() {
            return Err(TranscriptionError::ModelNotAvailable(format!(
                "missing artifacts under {}",
                model_dir.display()
            )));
        }

        let session = build_session(&paths, device)?;
        let vocab = Arc::new(load_vocab(&paths.tokens)?);
        info!(device = %device, "whisper engine loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            vocab,
        })
    }
}

#[async_trait]
impl SpeechEngine for WhisperEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcription, TranscriptionError> {
        // Concurrent requests queue on the async lock; the owned guard
        // moves into the blocking task and releases when it finishes.
        let mut session = Arc::clone(&self.session).lock_owned().await;

        let path: PathBuf = path.to_path_buf();
        let vocab = Arc::clone(&self.vocab);

        tokio::task::spawn_blocking(move || transcribe_single_pass(&mut session, &vocab, &path))
            .await
            .inference("task join")?
    }
}

fn transcribe_single_pass(
    session: &mut ort::session::Session,
    vocab: &[String],
    path: &Path,
) -> Result<Transcription, TranscriptionError> {
    let samples = decode_media(path)?;
    let duration_seconds = samples.len() as f64 / TARGET_SAMPLE_RATE as f64;

    let labels = run_encoder(session, &samples)?;
    let text = ctc_collapse(&labels, vocab, 0);
    debug!(frames = labels.len(), duration_seconds, "single-pass decode complete");

    Ok(Transcription {
        text,
        language: Some(MODEL_LANGUAGE.into()),
        duration_seconds: Some(duration_seconds),
    })
}
