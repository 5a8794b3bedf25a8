//! Generic chunked ASR pipeline adapter (feature-gated behind `ort`).
//!
//! Splits the audio into `chunk_length_s` windows, batches them through
//! the encoder, and concatenates the decoded text. This is the
//! "pipeline" variant of the engine seam; it reports text only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::audio::{ctc_collapse, decode_media, TARGET_SAMPLE_RATE};
use crate::device::Device;
use crate::engine::SpeechEngine;
use crate::model::{load_vocab, ModelPaths};
use crate::types::{ResultExt, Transcription, TranscriptionError};

/// Chunked pipeline over a CTC encoder model.
pub struct PipelineEngine {
    session: Arc<Mutex<ort::session::Session>>,
    vocab: Arc<Vec<String>>,
    chunk_length_s: u32,
    batch_size: usize,
}

impl PipelineEngine {
    /// Load the pipeline from artifacts under `model_dir`, bound to `device`.
    ///
    /// `chunk_length_s` controls audio chunking granularity and comes
    /// from startup config, not from the request path. `batch_size` is
    /// a throughput hint for how many chunks run per encoder call.
    pub fn load(
        model_dir: &Path,
        device: Device,
        chunk_length_s: u32,
        batch_size: usize,
    ) -> Result<Self, TranscriptionError> {
        let paths = ModelPaths::from_dir(model_dir);
        if !paths.all_exist() {
            return Err(TranscriptionError::ModelNotAvailable(format!(
                "missing artifacts under {}",
                model_dir.display()
            )));
        }

        let session = build_session(&paths, device)?;
        let vocab = Arc::new(load_vocab(&paths.tokens)?);
        info!(device = %device, chunk_length_s, "pipeline engine loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            vocab,
            chunk_length_s,
            batch_size,
        })
    }
}

#[async_trait]
impl SpeechEngine for PipelineEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcription, TranscriptionError> {
        // Concurrent requests queue on the async lock; the owned guard
        // moves into the blocking task and releases when it finishes.
        // A valid request never sees a "busy" failure.
        let mut session = Arc::clone(&self.session).lock_owned().await;

        let path: PathBuf = path.to_path_buf();
        let vocab = Arc::clone(&self.vocab);
        let chunk_length_s = self.chunk_length_s;
        let batch_size = self.batch_size;

        tokio::task::spawn_blocking(move || {
            transcribe_chunked(&mut session, &vocab, chunk_length_s, batch_size, &path)
        })
        .await
        .inference("task join")?
    }
}

fn transcribe_chunked(
    session: &mut ort::session::Session,
    vocab: &[String],
    chunk_length_s: u32,
    batch_size: usize,
    path: &Path,
) -> Result<Transcription, TranscriptionError> {
    let samples = decode_media(path)?;
    let chunk_len = chunk_length_s as usize * TARGET_SAMPLE_RATE;

    let mut labels: Vec<usize> = Vec::new();
    for batch in samples.chunks(chunk_len * batch_size) {
        for chunk in batch.chunks(chunk_len) {
            labels.extend(run_encoder(session, chunk)?);
        }
    }

    let text = ctc_collapse(&labels, vocab, 0);
    debug!(frames = labels.len(), "pipeline decode complete");
    Ok(Transcription::plain(text))
}

/// Build an ONNX session for `paths.encoder` on the requested device.
pub(crate) fn build_session(
    paths: &ModelPaths,
    device: Device,
) -> Result<ort::session::Session, TranscriptionError> {
    let builder = ort::session::Session::builder()
        .inference("session builder")?
        .with_intra_threads(2)
        .inference("intra threads")?
        .with_log_level(ort::logging::LogLevel::Warning)
        .inference("log level")?;

    let builder = match device {
        Device::Cuda => builder
            .with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
            ])
            .inference("cuda provider")?,
        Device::Cpu => builder,
    };

    builder
        .commit_from_file(&paths.encoder)
        .inference("load encoder")
}

/// Run one chunk through the encoder, returning greedy frame labels.
pub(crate) fn run_encoder(
    session: &mut ort::session::Session,
    chunk: &[f32],
) -> Result<Vec<usize>, TranscriptionError> {
    let shape = vec![1i64, chunk.len() as i64];
    let input = ort::value::Tensor::from_array((shape, chunk.to_vec())).inference("input tensor")?;

    let outputs = session.run(ort::inputs![input]).inference("encoder run")?;
    let (out_shape, logits) = outputs[0]
        .try_extract_tensor::<f32>()
        .inference("extract logits")?;

    let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();
    if dims.len() != 3 || dims[0] != 1 {
        return Err(TranscriptionError::Inference(format!(
            "unexpected logits shape: {dims:?}"
        )));
    }
    let (frames, classes) = (dims[1], dims[2]);

    let mut labels = Vec::with_capacity(frames);
    for t in 0..frames {
        let row = &logits[t * classes..(t + 1) * classes];
        let best = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        labels.push(best);
    }
    Ok(labels)
}
