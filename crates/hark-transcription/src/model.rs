//! Model artifact resolution — typed paths under the model directory
//! and optional download from `HuggingFace`.

use std::path::{Path, PathBuf};

#[cfg(feature = "ort")]
use crate::types::{ResultExt, TranscriptionError};
#[cfg(feature = "ort")]
use tracing::{debug, info, warn};

/// `HuggingFace` repository holding the ONNX export of the model.
#[cfg(feature = "ort")]
const HF_REPO: &str = "hark-ai/asr-ctc-onnx";

/// Typed paths for the required model files.
pub struct ModelPaths {
    /// Acoustic encoder (`encoder.onnx`).
    pub encoder: PathBuf,
    /// Token vocabulary (`tokens.txt`).
    pub tokens: PathBuf,
}

impl ModelPaths {
    /// All required model filenames.
    pub const NAMES: &[&str] = &["encoder.onnx", "tokens.txt"];

    /// Construct paths for all model files under `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            encoder: dir.join("encoder.onnx"),
            tokens: dir.join("tokens.txt"),
        }
    }

    /// Check if all required files exist.
    pub fn all_exist(&self) -> bool {
        self.encoder.exists() && self.tokens.exists()
    }
}

/// Default model directory under `~/.hark/models/asr/`.
pub fn default_model_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(format!("{home}/.hark/models/asr"))
}

/// Check if all required model files exist locally.
pub fn is_model_cached(model_dir: impl AsRef<Path>) -> bool {
    ModelPaths::from_dir(model_dir).all_exist()
}

/// Download model files from `HuggingFace` if not already cached.
///
/// Files are fetched into `HuggingFace`'s cache, then copied under
/// `model_dir`. Model loading itself is fatal-at-startup; this runs
/// before any request is served.
#[cfg(feature = "ort")]
pub async fn ensure_model(model_dir: impl AsRef<Path>) -> Result<(), TranscriptionError> {
    let model_dir = model_dir.as_ref().to_path_buf();

    if is_model_cached(&model_dir) {
        debug!("model files already cached at {}", model_dir.display());
        return Ok(());
    }

    info!("downloading model artifacts from HuggingFace...");
    std::fs::create_dir_all(&model_dir).map_err(TranscriptionError::Io)?;

    // Run download on blocking thread (hf-hub uses sync HTTP)
    let dir = model_dir.clone();
    tokio::task::spawn_blocking(move || download_model_files(&dir))
        .await
        .model("task join")?
}

#[cfg(feature = "ort")]
fn download_model_files(model_dir: &Path) -> Result<(), TranscriptionError> {
    let api = hf_hub::api::sync::Api::new().model("HF API init")?;
    let repo = api.model(HF_REPO.to_string());

    for &filename in ModelPaths::NAMES {
        let target = model_dir.join(filename);
        if target.exists() {
            debug!("skipping {filename} (already exists)");
            continue;
        }

        info!("downloading {filename}...");
        match repo.get(filename) {
            Ok(cached_path) => {
                if cached_path != target {
                    let _ = std::fs::copy(&cached_path, &target)
                        .model(&format!("copy {filename}"))?;
                }
                debug!("downloaded {filename}");
            }
            Err(e) => {
                warn!("failed to download {filename}: {e}");
                return Err(TranscriptionError::ModelNotAvailable(format!(
                    "download failed for {filename}: {e}"
                )));
            }
        }
    }

    info!("all model files ready at {}", model_dir.display());
    Ok(())
}

/// Load vocabulary from tokens.txt (one token per line).
#[cfg(feature = "ort")]
pub fn load_vocab(tokens_path: &Path) -> Result<Vec<String>, TranscriptionError> {
    let content = std::fs::read_to_string(tokens_path).model("read tokens.txt")?;
    Ok(content.lines().map(String::from).collect())
}
