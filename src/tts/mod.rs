//! Cached speech synthesis.
//!
//! Synthesis itself is delegated to a [`SynthesisBackend`](crate::SynthesisBackend);
//! this module decides whether a call is needed at all and measures the audio
//! that comes back.
//!
//! # Cache Layout
//!
//! Audio is keyed by the md5 of `"{voice}:{normalized text}"`. Text is trimmed
//! and cut to 1000 characters (plus `...`) before hashing and before it is
//! sent to the backend.
//!
//! | Tier | Capacity | Lifetime |
//! |---|---|---|
//! | memory | 50 entries, new entries refused when full | process |
//! | disk (`tts_cache_*/<fingerprint>.mp3`) | unbounded | until cleared or the cache is dropped |
//!
//! The disk tier never evicts. Long-running deployments should call
//! [`SpeechManager::clear_cache`] periodically.

pub mod cache;
pub mod config;
pub mod duration;
pub mod error;
pub mod manager;

pub use cache::{key_for, normalize_text, ContentAddressedCache, Fingerprint};
pub use config::{SpeechConfig, SpeechConfigBuilder};
pub use duration::{audio_duration, probe_duration, DecodeError};
pub use error::{SpeechError, UpstreamError};
pub use manager::{SpeakRequest, SpeakResponse, SpeechManager, SpeechStatus};
