//! The two lifecycle hooks: one-time model load and per-request
//! transformation.

use std::sync::Arc;
use std::time::Instant;

use hark_transcription::SpeechEngine;
use tracing::{debug, info};

use crate::config::HandlerConfig;
use crate::error::Result;
use crate::request::{
    detect_variant, parse_remote_reference, RequestKind, DEFAULT_RESPONSE_CONTENT_TYPE,
};
use crate::staging::StagedMedia;
use crate::store::ObjectStore;

/// Transform duration histogram (seconds, labels: variant). Covers
/// acquisition + staging + transcription, not response serialization.
pub const TRANSFORM_DURATION_SECONDS: &str = "transform_duration_seconds";

/// Construct the transcription engine once, at startup.
///
/// Binds the adapter named by `config.engine` to the artifacts under
/// `config.model_dir` and the device selected at startup. Failure here
/// is fatal to the process: without an engine no request can be
/// served. Built without the `ort` feature this always reports
/// `ModelNotAvailable`.
#[cfg(feature = "ort")]
pub async fn load_model(config: &HandlerConfig) -> Result<Arc<dyn SpeechEngine>> {
    use crate::config::EngineKind;
    use hark_transcription::{PipelineEngine, WhisperEngine};

    let device = config.device;
    let config = config.clone();

    // Fetch missing artifacts before binding a session; serving
    // containers usually mount them, so this is a no-op in production.
    hark_transcription::model::ensure_model(&config.model_dir).await?;

    // Session construction reads large artifacts; keep it off the executor.
    let engine: Arc<dyn SpeechEngine> = tokio::task::spawn_blocking(move || {
        match config.engine {
            EngineKind::Pipeline => PipelineEngine::load(
                &config.model_dir,
                config.device,
                config.chunk_length_s,
                config.batch_size,
            )
            .map(|e| Arc::new(e) as Arc<dyn SpeechEngine>),
            EngineKind::Whisper => WhisperEngine::load(&config.model_dir, config.device)
                .map(|e| Arc::new(e) as Arc<dyn SpeechEngine>),
        }
    })
    .await
    .map_err(|e| {
        crate::error::HandlerError::Engine(hark_transcription::TranscriptionError::Inference(
            format!("load task join: {e}"),
        ))
    })??;

    info!(device = %device, "model loaded");
    Ok(engine)
}

/// Stub loader for builds without the `ort` feature.
#[cfg(not(feature = "ort"))]
pub async fn load_model(config: &HandlerConfig) -> Result<Arc<dyn SpeechEngine>> {
    Err(crate::error::HandlerError::Engine(
        hark_transcription::TranscriptionError::ModelNotAvailable(format!(
            "built without the `ort` feature; cannot load {}",
            config.model_dir.display()
        )),
    ))
}

/// Transform one inference request into a serialized transcription.
///
/// Resolves the body to a staged local file (inline bytes or
/// object-store download), transcribes it, and returns the JSON
/// envelope plus the response content type (caller override or
/// `application/json`). The staged file is removed on every exit path.
pub async fn transform(
    engine: &dyn SpeechEngine,
    store: &dyn ObjectStore,
    body: &[u8],
    request_content_type: Option<&str>,
    response_content_type: Option<&str>,
) -> Result<(String, String)> {
    let started = Instant::now();

    let kind = detect_variant(request_content_type, body.len());
    debug!(
        variant = kind.as_str(),
        body_len = body.len(),
        content_type = request_content_type.unwrap_or("<none>"),
        "resolving request payload"
    );

    let staged = match kind {
        RequestKind::InlineMedia => StagedMedia::from_bytes(body)?,
        RequestKind::RemoteReference => {
            let location = parse_remote_reference(body)?;
            let staged = StagedMedia::empty()?;
            let _ = store
                .download(&location.bucket, &location.key, staged.path())
                .await?;
            staged
        }
    };

    let result = engine.transcribe(staged.path()).await?;

    let elapsed = started.elapsed();
    info!(
        variant = kind.as_str(),
        elapsed_ms = elapsed.as_millis() as u64,
        "transcription complete"
    );
    metrics::histogram!(TRANSFORM_DURATION_SECONDS, "variant" => kind.as_str())
        .record(elapsed.as_secs_f64());

    let serialized = serde_json::to_string(&result)?;
    let content_type = response_content_type
        .unwrap_or(DEFAULT_RESPONSE_CONTENT_TYPE)
        .to_string();
    Ok((serialized, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::store::MockObjectStore;
    use assert_matches::assert_matches;
    use hark_transcription::{FailingEngine, StaticEngine, Transcription};

    fn engine() -> StaticEngine {
        StaticEngine::new(Transcription {
            text: "hello world".into(),
            language: Some("en".into()),
            duration_seconds: Some(1.5),
        })
    }

    fn no_store() -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store.expect_download().never();
        store
    }

    #[tokio::test]
    async fn inline_payload_stages_exact_bytes() {
        let payload = vec![0x52u8; 5000];
        let engine = engine();
        let store = no_store();

        let (json, ct) = transform(&engine, &store, &payload, None, None)
            .await
            .unwrap();

        let calls = engine.captured();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, payload);
        // Staged file is gone once the request scope ends
        assert!(!calls[0].0.exists());

        let decoded: Transcription = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.text, "hello world");
        assert_eq!(ct, "application/json");
    }

    #[tokio::test]
    async fn remote_reference_downloads_into_staged_file() {
        let engine = engine();
        let mut store = MockObjectStore::new();
        store
            .expect_download()
            .withf(|bucket, key, _dest| bucket == "mybucket" && key == "audio/clip1.wav")
            .times(1)
            .returning(|_, _, dest| {
                std::fs::write(dest, b"downloaded-media").map_err(HandlerError::Io)?;
                Ok(16)
            });

        let body = br#"{"s3_location": "s3://mybucket/audio/clip1.wav"}"#;
        let (json, _ct) = transform(&engine, &store, body, Some("application/json"), None)
            .await
            .unwrap();

        let calls = engine.captured();
        assert_eq!(calls[0].1, b"downloaded-media");
        assert!(!calls[0].0.exists());
        assert!(json.contains("hello world"));
    }

    #[tokio::test]
    async fn malformed_json_fails_before_download() {
        let engine = engine();
        let store = no_store();
        let err = transform(&engine, &store, b"{oops", Some("application/json"), None)
            .await
            .unwrap_err();
        assert_matches!(err, HandlerError::Parse(_));
        assert!(engine.captured().is_empty());
    }

    #[tokio::test]
    async fn missing_location_fails_before_download() {
        let engine = engine();
        let store = no_store();
        let err = transform(
            &engine,
            &store,
            br#"{"wrong": "field"}"#,
            Some("application/json"),
            None,
        )
        .await
        .unwrap_err();
        assert_matches!(err, HandlerError::MissingField("s3_location"));
        assert!(engine.captured().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let engine = engine();
        let mut store = MockObjectStore::new();
        store
            .expect_download()
            .returning(|_, _, _| Err(HandlerError::Storage("403".into())));

        let body = br#"{"s3_location": "s3://b/k"}"#;
        let err = transform(&engine, &store, body, Some("application/json"), None)
            .await
            .unwrap_err();
        assert_matches!(err, HandlerError::Storage(_));
        assert!(engine.captured().is_empty());
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        let store = no_store();
        let err = transform(&FailingEngine, &store, &[0u8; 2000], None, None)
            .await
            .unwrap_err();
        assert_matches!(err, HandlerError::Engine(_));
    }

    #[tokio::test]
    async fn response_content_type_is_caller_controlled() {
        let engine = engine();
        let store = no_store();
        let (_, ct) = transform(
            &engine,
            &store,
            &[0u8; 2000],
            Some("audio/wav"),
            Some("application/json; verbose=true"),
        )
        .await
        .unwrap();
        assert_eq!(ct, "application/json; verbose=true");
    }

    #[tokio::test]
    async fn small_inline_clip_with_media_content_type_is_not_parsed_as_json() {
        // 40 bytes of fake media, below the fallback threshold: the
        // explicit content type keeps it on the inline path.
        let payload = b"RIFF$\x00\x00\x00WAVEfmt tiny-but-valid-enough!!";
        let engine = engine();
        let store = no_store();
        let (_, _) = transform(&engine, &store, payload, Some("audio/wav"), None)
            .await
            .unwrap();
        assert_eq!(engine.captured()[0].1, payload);
    }
}
