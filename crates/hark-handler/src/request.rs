//! Request variant detection and RemoteReference parsing.

use crate::error::{HandlerError, Result};

/// Fallback size threshold separating InlineMedia from RemoteReference
/// when the content type does not settle it.
///
/// Inherited heuristic: a RemoteReference body is a tiny JSON pointer,
/// media bodies are large. It misroutes sub-1000-byte media clips,
/// which is exactly why content-type dispatch runs first; the
/// threshold only applies to requests with no usable content type.
pub const INLINE_SIZE_THRESHOLD: usize = 1000;

/// Content type used for responses unless the caller overrides it.
pub const DEFAULT_RESPONSE_CONTENT_TYPE: &str = "application/json";

/// The two logical request variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The body bytes are the media content itself.
    InlineMedia,
    /// The body is a JSON pointer to media in the object store.
    RemoteReference,
}

impl RequestKind {
    /// Label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InlineMedia => "inline",
            Self::RemoteReference => "remote",
        }
    }
}

/// Decide which variant a request is.
///
/// Explicit discriminator first: `application/json` declares a
/// RemoteReference, media types declare InlineMedia. Absent or
/// unrecognized content types fall back to [`INLINE_SIZE_THRESHOLD`].
pub fn detect_variant(content_type: Option<&str>, body_len: usize) -> RequestKind {
    if let Some(ct) = content_type {
        // Strip parameters: "application/json; charset=utf-8" → "application/json"
        let essence = ct.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case("application/json") {
            return RequestKind::RemoteReference;
        }
        let lowered = essence.to_ascii_lowercase();
        if lowered.starts_with("audio/")
            || lowered.starts_with("video/")
            || lowered == "application/octet-stream"
        {
            return RequestKind::InlineMedia;
        }
    }
    if body_len >= INLINE_SIZE_THRESHOLD {
        RequestKind::InlineMedia
    } else {
        RequestKind::RemoteReference
    }
}

/// A parsed `s3://bucket/key...` object location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    /// Bucket name (third `/`-delimited segment of the URI).
    pub bucket: String,
    /// Object key (remaining segments rejoined with `/`).
    pub key: String,
}

impl S3Location {
    /// Parse an `s3://bucket/key/with/slashes` string.
    pub fn parse(uri: &str) -> Result<Self> {
        let segments: Vec<&str> = uri.split('/').collect();
        let bucket = segments.get(2).copied().unwrap_or_default();
        let key = segments.get(3..).unwrap_or_default().join("/");

        if !uri.starts_with("s3://") || bucket.is_empty() || key.is_empty() {
            return Err(HandlerError::InvalidLocation(uri.to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key,
        })
    }
}

/// Parse a RemoteReference body: JSON with a required `s3_location`.
///
/// Malformed JSON and a missing field both fail here, before any
/// download is attempted.
pub fn parse_remote_reference(body: &[u8]) -> Result<S3Location> {
    let doc: serde_json::Value = serde_json::from_slice(body)?;
    let uri = doc
        .get("s3_location")
        .and_then(serde_json::Value::as_str)
        .ok_or(HandlerError::MissingField("s3_location"))?;
    S3Location::parse(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn json_content_type_is_remote() {
        assert_eq!(
            detect_variant(Some("application/json"), 50_000),
            RequestKind::RemoteReference
        );
        assert_eq!(
            detect_variant(Some("application/json; charset=utf-8"), 10),
            RequestKind::RemoteReference
        );
    }

    #[test]
    fn media_content_types_are_inline() {
        for ct in ["audio/wav", "audio/mpeg", "video/mp4", "application/octet-stream"] {
            assert_eq!(detect_variant(Some(ct), 10), RequestKind::InlineMedia, "{ct}");
        }
    }

    #[test]
    fn fallback_threshold_at_1000_bytes() {
        assert_eq!(detect_variant(None, 999), RequestKind::RemoteReference);
        assert_eq!(detect_variant(None, 1000), RequestKind::InlineMedia);
        assert_eq!(detect_variant(None, 5000), RequestKind::InlineMedia);
    }

    #[test]
    fn unrecognized_content_type_uses_threshold() {
        assert_eq!(
            detect_variant(Some("text/plain"), 34),
            RequestKind::RemoteReference
        );
        assert_eq!(
            detect_variant(Some("text/plain"), 4096),
            RequestKind::InlineMedia
        );
    }

    #[test]
    fn s3_location_bucket_and_key() {
        let loc = S3Location::parse("s3://bucket/key1/key2").unwrap();
        assert_eq!(loc.bucket, "bucket");
        assert_eq!(loc.key, "key1/key2");
    }

    #[test]
    fn s3_location_single_segment_key() {
        let loc = S3Location::parse("s3://mybucket/audio/clip1.wav").unwrap();
        assert_eq!(loc.bucket, "mybucket");
        assert_eq!(loc.key, "audio/clip1.wav");
    }

    #[test]
    fn s3_location_rejects_wrong_scheme() {
        let err = S3Location::parse("https://bucket/key").unwrap_err();
        assert_matches!(err, HandlerError::InvalidLocation(_));
    }

    #[test]
    fn s3_location_rejects_missing_key() {
        assert_matches!(
            S3Location::parse("s3://bucket").unwrap_err(),
            HandlerError::InvalidLocation(_)
        );
        assert_matches!(
            S3Location::parse("s3://bucket/").unwrap_err(),
            HandlerError::InvalidLocation(_)
        );
    }

    #[test]
    fn s3_location_rejects_empty_bucket() {
        assert_matches!(
            S3Location::parse("s3:///key").unwrap_err(),
            HandlerError::InvalidLocation(_)
        );
    }

    #[test]
    fn remote_reference_happy_path() {
        let body = br#"{"s3_location": "s3://mybucket/audio/clip1.wav"}"#;
        let loc = parse_remote_reference(body).unwrap();
        assert_eq!(loc.bucket, "mybucket");
        assert_eq!(loc.key, "audio/clip1.wav");
    }

    #[test]
    fn remote_reference_invalid_json_is_parse_error() {
        let err = parse_remote_reference(b"not json at all").unwrap_err();
        assert_matches!(err, HandlerError::Parse(_));
    }

    #[test]
    fn remote_reference_missing_field_is_field_error() {
        let err = parse_remote_reference(br#"{"location": "s3://b/k"}"#).unwrap_err();
        assert_matches!(err, HandlerError::MissingField("s3_location"));
    }

    #[test]
    fn remote_reference_non_string_field_is_field_error() {
        let err = parse_remote_reference(br#"{"s3_location": 42}"#).unwrap_err();
        assert_matches!(err, HandlerError::MissingField("s3_location"));
    }
}
