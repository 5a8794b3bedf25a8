//! Media decode for the ONNX adapters (feature-gated behind `ort`).
//!
//! Decodes whatever container symphonia can probe (wav, mp3, mp4/m4a,
//! aac, ogg) and resamples to the 16kHz mono f32 stream both encoders
//! expect.

use std::fs::File;
use std::path::Path;

use rubato::{FftFixedIn, Resampler};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::types::{ResultExt, TranscriptionError};

/// Sample rate both encoder models are trained on.
pub const TARGET_SAMPLE_RATE: usize = 16_000;

/// Interleaved sample buffer plus the signal parameters it was sized
/// for, so a mid-stream spec change triggers reallocation.
struct CachedSampleBuffer {
    buf: SampleBuffer<f32>,
    rate: u32,
    channels: symphonia::core::audio::Channels,
    capacity: usize,
}

/// Decode the media file at `path` to 16kHz mono f32 samples.
pub fn decode_media(path: &Path) -> Result<Vec<f32>, TranscriptionError> {
    let file = File::open(path).map_err(TranscriptionError::Io)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let _ = hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .audio_decode("probe")?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| TranscriptionError::AudioDecode("no audio track".into()))?;
    let track_id = track.id;
    let src_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| TranscriptionError::AudioDecode("unknown sample rate".into()))?
        as usize;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .audio_decode("make decoder")?;

    let mut mono: Vec<f32> = Vec::new();
    let mut sample_buf: Option<CachedSampleBuffer> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("packet: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Skip undecodable frames rather than failing the request
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let capacity = decoded.capacity();

        // The signal spec can change mid-stream (chained streams,
        // sample-rate switches); a stale buffer would panic inside
        // copy_interleaved_ref, so reallocate on any mismatch.
        let stale = sample_buf.as_ref().map_or(true, |c| {
            c.rate != spec.rate || c.channels != spec.channels || c.capacity < capacity
        });
        if stale {
            sample_buf = Some(CachedSampleBuffer {
                buf: SampleBuffer::<f32>::new(capacity as u64, spec),
                rate: spec.rate,
                channels: spec.channels,
                capacity,
            });
        }
        let Some(cached) = sample_buf.as_mut() else {
            return Err(TranscriptionError::AudioDecode("sample buffer unavailable".into()));
        };
        cached.buf.copy_interleaved_ref(decoded);

        // Downmix interleaved channels to mono by averaging
        let ch = spec.channels.count().max(1);
        for frame in cached.buf.samples().chunks(ch) {
            let sum: f32 = frame.iter().sum();
            mono.push(sum / ch as f32);
        }
    }

    if mono.is_empty() {
        return Err(TranscriptionError::AudioDecode("no samples decoded".into()));
    }

    if src_rate == TARGET_SAMPLE_RATE {
        return Ok(mono);
    }
    resample(&mono, src_rate)
}

/// Resample mono samples from `src_rate` to [`TARGET_SAMPLE_RATE`].
fn resample(samples: &[f32], src_rate: usize) -> Result<Vec<f32>, TranscriptionError> {
    const CHUNK: usize = 4096;
    let mut resampler = FftFixedIn::<f32>::new(src_rate, TARGET_SAMPLE_RATE, CHUNK, 2, 1)
        .inference("resampler init")?;

    let mut out = Vec::with_capacity(samples.len() * TARGET_SAMPLE_RATE / src_rate + CHUNK);
    let mut pos = 0;
    while pos + CHUNK <= samples.len() {
        let frames = resampler
            .process(&[&samples[pos..pos + CHUNK]], None)
            .inference("resample")?;
        out.extend_from_slice(&frames[0]);
        pos += CHUNK;
    }
    // Pad the final partial chunk with silence
    if pos < samples.len() {
        let mut tail = samples[pos..].to_vec();
        tail.resize(CHUNK, 0.0);
        let frames = resampler.process(&[&tail], None).inference("resample tail")?;
        out.extend_from_slice(&frames[0]);
    }
    Ok(out)
}

/// Collapse greedy frame labels into text: drop repeats, drop blanks,
/// look the rest up in the vocabulary.
pub fn ctc_collapse(labels: &[usize], vocab: &[String], blank_id: usize) -> String {
    let mut text = String::new();
    let mut prev = usize::MAX;
    for &id in labels {
        if id != prev && id != blank_id {
            if let Some(tok) = vocab.get(id) {
                // SentencePiece-style word boundary marker
                if let Some(rest) = tok.strip_prefix('\u{2581}') {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(rest);
                } else {
                    text.push_str(tok);
                }
            }
        }
        prev = id;
    }
    text
}
