//! # lipsync-rs
//!
//! Speech-to-animation synchronization for talking avatars.
//!
//! ## Features
//!
//! - **Viseme timelines**: mouth-shape events from text or aligned phonemes
//! - **Duration-aware timing**: timelines stretched to the real audio length
//! - **Content-addressed audio cache**: identical (voice, text) requests never
//!   reach the synthesis provider twice
//!
//! ## Quick Start
//!
//! ```rust
//! use lipsync_rs::lipsync::{from_phonemes, from_text, PhonemeSegment, Viseme};
//!
//! // Heuristic timing spread over a known audio duration.
//! let timeline = from_text("Hello, world!", Some(1.2));
//! let total: f64 = timeline.iter().map(|e| e.duration).sum();
//! assert!((total - 1.2).abs() < 1e-9);
//!
//! // Exact timing from an aligner.
//! let events = from_phonemes(&[PhonemeSegment::new("m", 0.0, 0.2)]);
//! assert_eq!(events[0].viseme, Viseme::Closed);
//! ```
//!
//! Synthesis goes through [`tts::SpeechManager`], which wraps any
//! [`SynthesisBackend`] with the cache.

pub mod lipsync;
pub mod tts;

pub use tts::UpstreamError;

/// A single synthesis call handed to a [`SynthesisBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisRequest<'a> {
    pub project_uuid: &'a str,
    pub voice_uuid: &'a str,
    /// Already normalized text.
    pub text: &'a str,
}

/// Common interface for text-to-speech providers.
///
/// Implementations perform the (possibly slow, network-bound) synthesis and
/// return encoded audio bytes. Timeouts, cancellation and retries are the
/// implementation's concern; failures are reported as a typed
/// [`UpstreamError`] and passed through unchanged.
pub trait SynthesisBackend: Send + Sync {
    /// Human-readable provider name, used in logs and status.
    fn provider(&self) -> &str;

    /// Synthesize speech for `request.text` with the requested voice.
    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Vec<u8>, UpstreamError>;
}
