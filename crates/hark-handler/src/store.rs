//! Object-store collaborator: blob download addressed by (bucket, key).
//!
//! Authentication and retry policy belong to the store, not to this
//! handler; failures propagate untranslated as
//! [`HandlerError::Storage`].

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{HandlerError, Result};

/// Blob-download capability addressed by (bucket, key).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the object at (bucket, key) into `dest`, overwriting
    /// its contents. Returns the number of bytes written.
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;
}

/// S3-compatible store speaking path-style HTTP GET.
///
/// `GET {endpoint}/{bucket}/{key}` — works against AWS S3 for public
/// or ambient-credentialed access and against any S3-compatible store
/// (MinIO, localstack, a wiremock double in tests).
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpObjectStore {
    /// Create a store against `endpoint` (no trailing slash needed).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.endpoint)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let url = self.object_url(bucket, key);
        info!(bucket, key, "downloading media object");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HandlerError::Storage(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandlerError::Storage(format!(
                "GET {url}: unexpected status {status}"
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| HandlerError::Storage(format!("GET {url}: body read: {e}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        // Flush so the staged file is readable by path immediately
        file.flush().await?;

        debug!(bucket, key, written, "download complete");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn object_url_joins_bucket_and_key() {
        let store = HttpObjectStore::new("http://localhost:9000/");
        assert_eq!(
            store.object_url("mybucket", "audio/clip1.wav"),
            "http://localhost:9000/mybucket/audio/clip1.wav"
        );
    }

    #[tokio::test]
    async fn download_writes_body_to_dest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mybucket/audio/clip1.wav"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"wav-bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpObjectStore::new(server.uri());
        let dest = tempfile::NamedTempFile::new().unwrap();
        let written = store
            .download("mybucket", "audio/clip1.wav", dest.path())
            .await
            .unwrap();

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(dest.path()).unwrap(), b"wav-bytes");
    }

    #[tokio::test]
    async fn download_missing_object_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = HttpObjectStore::new(server.uri());
        let dest = tempfile::NamedTempFile::new().unwrap();
        let err = store
            .download("mybucket", "missing.wav", dest.path())
            .await
            .unwrap_err();
        assert_matches!(err, HandlerError::Storage(msg) if msg.contains("404"));
    }

    #[tokio::test]
    async fn download_network_failure_is_storage_error() {
        // Nothing listens on this port
        let store = HttpObjectStore::new("http://127.0.0.1:1");
        let dest = tempfile::NamedTempFile::new().unwrap();
        let err = store.download("b", "k", dest.path()).await.unwrap_err();
        assert_matches!(err, HandlerError::Storage(_));
    }
}
