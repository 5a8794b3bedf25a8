//! Process-wide handler configuration.
//!
//! Built once from the environment at startup and passed down
//! explicitly; the request path never reads the environment. A missing
//! or non-numeric chunk length is fatal before the server ever binds.

use std::path::PathBuf;

use hark_transcription::Device;

use crate::error::{HandlerError, Result};

/// Environment variable holding the audio chunk length in seconds.
pub const CHUNK_LENGTH_VAR: &str = "HARK_CHUNK_LENGTH_S";

/// Default model artifact directory inside the serving container.
const DEFAULT_MODEL_DIR: &str = "/opt/ml/model";

/// Default S3-compatible endpoint for RemoteReference downloads.
const DEFAULT_S3_ENDPOINT: &str = "https://s3.amazonaws.com";

/// Default number of chunks per encoder call for the pipeline engine.
const DEFAULT_BATCH_SIZE: usize = 8;

/// Which engine adapter to bind at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Generic chunked ASR pipeline.
    #[default]
    Pipeline,
    /// Model-specific single-pass engine.
    Whisper,
}

/// Startup configuration for the loader and transformer.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Directory holding the serialized model artifacts.
    pub model_dir: PathBuf,
    /// Execution device selected at startup.
    pub device: Device,
    /// Audio chunking granularity in seconds.
    pub chunk_length_s: u32,
    /// Batching hint for the pipeline engine.
    pub batch_size: usize,
    /// Which adapter to construct.
    pub engine: EngineKind,
    /// S3-compatible endpoint for object downloads.
    pub s3_endpoint: String,
}

impl HandlerConfig {
    /// Build configuration from the process environment.
    ///
    /// `HARK_CHUNK_LENGTH_S` is required and must be an integer;
    /// everything else has a default. Errors here abort startup.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source (tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let chunk_length_s = lookup(CHUNK_LENGTH_VAR)
            .ok_or_else(|| HandlerError::Config(format!("{CHUNK_LENGTH_VAR} is not set")))?
            .trim()
            .parse::<u32>()
            .map_err(|e| HandlerError::Config(format!("{CHUNK_LENGTH_VAR}: {e}")))?;

        let batch_size = match lookup("HARK_BATCH_SIZE") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|e| HandlerError::Config(format!("HARK_BATCH_SIZE: {e}")))?,
            None => DEFAULT_BATCH_SIZE,
        };

        let engine = match lookup("HARK_ENGINE").as_deref() {
            Some("whisper") => EngineKind::Whisper,
            Some("pipeline") | None => EngineKind::Pipeline,
            Some(other) => {
                return Err(HandlerError::Config(format!(
                    "HARK_ENGINE: unknown engine {other:?}"
                )))
            }
        };

        Ok(Self {
            model_dir: resolve_model_dir(lookup("HARK_MODEL_DIR")),
            device: Device::detect(),
            chunk_length_s,
            batch_size,
            engine,
            s3_endpoint: lookup("HARK_S3_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_S3_ENDPOINT.to_string()),
        })
    }
}

/// Resolve the model directory: explicit override, else the serving
/// container's artifact mount, else the local cache that model
/// download populates (development hosts have no `/opt/ml`).
fn resolve_model_dir(override_dir: Option<String>) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    let mounted = PathBuf::from(DEFAULT_MODEL_DIR);
    if mounted.is_dir() {
        mounted
    } else {
        hark_transcription::model::default_model_dir()
    }
}
