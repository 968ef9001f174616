use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::lipsync::{from_text, VisemeEvent};
use crate::{SynthesisBackend, SynthesisRequest};

use super::cache::{key_for, normalize_text, ContentAddressedCache};
use super::config::SpeechConfig;
use super::duration::audio_duration;
use super::error::{SpeechError, UpstreamError};

/// Payloads shorter than this are treated as a failed synthesis.
pub const MIN_AUDIO_BYTES: usize = 100;

/// Characters of input text included in log lines.
const LOG_PREVIEW_CHARS: usize = 60;

/// Request for audio and/or lip sync data for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    #[serde(default = "enabled")]
    pub return_audio: bool,
    #[serde(default = "enabled")]
    pub return_visemes: bool,
}

fn enabled() -> bool {
    true
}

impl SpeakRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            return_audio: true,
            return_visemes: true,
        }
    }
}

/// Base64 audio plus the viseme timeline aligned to its real duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeakResponse {
    pub audio_base64: Option<String>,
    pub visemes: Option<Vec<VisemeEvent>>,
    pub duration: Option<f64>,
}

/// Snapshot of the manager's health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechStatus {
    pub initialized: bool,
    pub voice_uuid: String,
    pub project_uuid: String,
    pub error: Option<String>,
    pub cache_size: usize,
    pub provider: String,
}

/// Text-to-speech front end that consults the audio cache before calling the
/// synthesis backend.
///
/// The manager owns its cache; the cache directory is removed when the
/// manager is dropped.
///
/// ```rust,no_run
/// use lipsync_rs::tts::{SpeakRequest, SpeechConfig, SpeechManager};
/// # use lipsync_rs::{SynthesisBackend, SynthesisRequest, tts::UpstreamError};
/// # struct Provider;
/// # impl SynthesisBackend for Provider {
/// #     fn provider(&self) -> &str { "example" }
/// #     fn synthesize(&self, _: &SynthesisRequest<'_>) -> Result<Vec<u8>, UpstreamError> {
/// #         Ok(vec![0; 4096])
/// #     }
/// # }
///
/// let manager = SpeechManager::new(SpeechConfig::from_env(), Provider)?;
/// let response = manager.speak(&SpeakRequest::new("Hello there"))?;
/// println!("{:?}", response.duration);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SpeechManager<B> {
    config: SpeechConfig,
    backend: B,
    cache: ContentAddressedCache,
    init_error: Option<String>,
}

impl<B: SynthesisBackend> SpeechManager<B> {
    /// Create a manager with a fresh cache directory.
    ///
    /// A missing API key does not fail construction; it is recorded and
    /// reported by [`status`](Self::status) and by every synthesis call.
    pub fn new(config: SpeechConfig, backend: B) -> Result<Self, SpeechError> {
        let cache = ContentAddressedCache::new()?;

        let has_key = config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        let init_error = if has_key {
            log::info!(
                "TTS initialized with {} (voice {}, project {})",
                backend.provider(),
                config.voice_uuid,
                config.project_uuid
            );
            None
        } else {
            let message = format!("{} API key not configured", backend.provider());
            log::error!("Error initializing TTS: {message}");
            Some(message)
        };

        Ok(Self {
            config,
            backend,
            cache,
            init_error,
        })
    }

    /// Provider identity this manager was built with.
    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    /// The audio cache consulted before every synthesis call.
    pub fn cache(&self) -> &ContentAddressedCache {
        &self.cache
    }

    /// Whether an API key was configured.
    pub fn is_initialized(&self) -> bool {
        self.init_error.is_none()
    }

    fn ensure_ready(&self) -> Result<(), SpeechError> {
        if let Some(error) = &self.init_error {
            return Err(SpeechError::NotInitialized(error.clone()));
        }
        if self.config.voice_uuid.trim().is_empty() {
            return Err(SpeechError::NotInitialized(
                "voice UUID not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Audio for `text`, from cache when possible.
    ///
    /// The text is trimmed and truncated before both hashing and synthesis,
    /// so cached audio always corresponds to what was actually spoken.
    pub fn text_to_speech(&self, text: &str) -> Result<Arc<[u8]>, SpeechError> {
        self.ensure_ready()?;

        let key = key_for(&self.config.voice_uuid, text);
        if let Some(audio) = self.cache.get(&key) {
            log::debug!("Audio cache hit for {key}");
            return Ok(audio);
        }

        let normalized = normalize_text(text);
        log::info!(
            "Generating speech with {}: {}",
            self.backend.provider(),
            preview(&normalized)
        );

        let request = SynthesisRequest {
            project_uuid: &self.config.project_uuid,
            voice_uuid: &self.config.voice_uuid,
            text: &normalized,
        };
        let audio = self.backend.synthesize(&request).inspect_err(|e| {
            log::error!("Error generating speech: {e}");
        })?;
        if audio.len() < MIN_AUDIO_BYTES {
            log::error!("Received only {} bytes of audio", audio.len());
            return Err(UpstreamError::PayloadTooSmall(audio.len()).into());
        }

        let len = audio.len();
        let audio = self.cache.put(&key, audio);
        log::info!(
            "Generated {len} bytes of audio using {}",
            self.backend.provider()
        );
        Ok(audio)
    }

    /// Like [`text_to_speech`](Self::text_to_speech), also writing the audio
    /// to `output_path`.
    pub fn text_to_speech_to_file(
        &self,
        text: &str,
        output_path: &Path,
    ) -> Result<Arc<[u8]>, SpeechError> {
        let audio = self.text_to_speech(text)?;
        std::fs::write(output_path, &audio)?;
        Ok(audio)
    }

    /// Audio for `text` and its duration in seconds.
    pub fn text_to_speech_with_duration(
        &self,
        text: &str,
    ) -> Result<(Arc<[u8]>, f64), SpeechError> {
        let audio = self.text_to_speech(text)?;
        let duration = audio_duration(&audio);
        Ok((audio, duration))
    }

    /// Audio for `text`, base64-encoded.
    pub fn text_to_speech_base64(&self, text: &str) -> Result<String, SpeechError> {
        let audio = self.text_to_speech(text)?;
        Ok(STANDARD.encode(&audio))
    }

    /// Synthesize `request.text` and build visemes timed to the real audio.
    pub fn speak(&self, request: &SpeakRequest) -> Result<SpeakResponse, SpeechError> {
        let mut response = SpeakResponse::default();
        if !request.return_audio && !request.return_visemes {
            return Ok(response);
        }

        let (audio, duration) = self.text_to_speech_with_duration(&request.text)?;
        if request.return_audio {
            response.audio_base64 = Some(STANDARD.encode(&audio));
        }
        if request.return_visemes {
            response.visemes = Some(from_text(&request.text, Some(duration)));
            response.duration = Some(duration);
        }
        Ok(response)
    }

    /// Current initialization state, identity and cache occupancy.
    pub fn status(&self) -> SpeechStatus {
        SpeechStatus {
            initialized: self.is_initialized(),
            voice_uuid: self.config.voice_uuid.clone(),
            project_uuid: self.config.project_uuid.clone(),
            error: self.init_error.clone(),
            cache_size: self.cache.len(),
            provider: self.backend.provider().to_string(),
        }
    }

    /// Empty both cache tiers. The next request for any text re-synthesizes.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
