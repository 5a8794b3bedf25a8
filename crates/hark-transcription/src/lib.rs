//! Speech-to-text engine abstraction for the hark inference handler.
//!
//! The request handler only ever sees the [`SpeechEngine`] trait: one
//! operation, `transcribe(path)`, against a local media file. Two ONNX
//! adapters implement it — a generic chunked pipeline and a
//! model-specific single-pass engine — and are interchangeable behind
//! the trait.
//!
//! # Architecture
//!
//! ```text
//! staged media file → symphonia decode → rubato resample to 16kHz mono f32
//! → encoder.onnx → frame logits → greedy decode → tokens.txt lookup → text
//! ```
//!
//! ## Crate Position
//!
//! Standalone (no hark crate dependencies).
//! Depended on by: hark-handler, hark-server.

// Always available (no heavy deps)
pub mod device;
pub mod engine;
pub mod model;
pub mod types;

// Feature-gated (require ort + symphonia + rubato)
#[cfg(feature = "ort")]
pub(crate) mod audio;
#[cfg(feature = "ort")]
pub mod pipeline;
#[cfg(feature = "ort")]
pub mod whisper;

pub use device::Device;
pub use engine::{FailingEngine, SpeechEngine, StaticEngine};
pub use types::{ResultExt, Transcription, TranscriptionError};
#[cfg(feature = "ort")]
pub use pipeline::PipelineEngine;
#[cfg(feature = "ort")]
pub use whisper::WhisperEngine;
