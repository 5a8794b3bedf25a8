//! # hark-handler
//!
//! The per-request transformation core of the hark speech-to-text
//! service. A request body is either the media itself (InlineMedia) or
//! a small JSON pointer to an object-store location (RemoteReference);
//! both are resolved to a staged local file, fed through the bound
//! [`SpeechEngine`](hark_transcription::SpeechEngine), and returned as
//! a JSON response envelope.
//!
//! Two lifecycle hooks mirror the hosting contract:
//! [`transform::load_model`] runs once at startup,
//! [`transform::transform`] runs once per request.
//!
//! ## Crate Position
//!
//! Depends on: hark-transcription.
//! Depended on by: hark-server.

pub mod config;
pub mod error;
pub mod request;
pub mod staging;
pub mod store;
pub mod transform;

pub use config::{EngineKind, HandlerConfig};
pub use error::{HandlerError, Result};
pub use request::{RequestKind, S3Location, DEFAULT_RESPONSE_CONTENT_TYPE, INLINE_SIZE_THRESHOLD};
pub use staging::StagedMedia;
pub use store::{HttpObjectStore, ObjectStore};
pub use transform::{load_model, transform};
