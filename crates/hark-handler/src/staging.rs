//! Staged-file discipline.
//!
//! The transcription engine reads local paths, not byte streams, so
//! every request resolves its payload into a uniquely-named temporary
//! file. The guard owns the file for the request scope and removes it
//! on drop — success, error, or early return all clean up, so
//! sustained load cannot grow the temp directory.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// A uniquely-named temporary file holding one request's media bytes.
///
/// Private to the request that created it; never shared across
/// requests. The underlying file is deleted when the guard drops.
pub struct StagedMedia {
    file: NamedTempFile,
}

impl StagedMedia {
    /// Stage inline payload bytes, byte-for-byte.
    ///
    /// The data is flushed before the path is handed out, so the
    /// engine sees the complete payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    /// Allocate an empty staged file for an object-store download to
    /// fill by path.
    pub fn empty() -> Result<Self> {
        Ok(Self {
            file: NamedTempFile::new()?,
        })
    }

    /// Path the engine (and the downloader) should use.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
