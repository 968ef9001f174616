/// Errors returned by [`SpeechManager`](super::SpeechManager) synthesis calls.
#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("TTS not initialized: {0}")]
    NotInitialized(String),
    #[error("Synthesis failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`SynthesisBackend`](crate::SynthesisBackend).
///
/// Backends classify provider failures themselves; the manager passes them
/// through unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Project or voice not found")]
    NotFound,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Streaming API requires special access")]
    StreamingUnavailable,
    #[error("Received audio payload is too small ({0} bytes)")]
    PayloadTooSmall(usize),
    #[error("Provider error: {0}")]
    Provider(String),
}
