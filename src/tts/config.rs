use derive_builder::Builder;

/// Project used when none is configured.
pub const DEFAULT_PROJECT_UUID: &str = "9d6b821e";

/// Voice used when none is configured.
pub const DEFAULT_VOICE_UUID: &str = "68b8d08b";

/// Environment variables read by [`SpeechConfig::from_env`].
pub const ENV_API_KEY: &str = "RESEMBLE_API_KEY";
pub const ENV_PROJECT_UUID: &str = "RESEMBLE_PROJECT_UUID";
pub const ENV_VOICE_UUID: &str = "RESEMBLE_VOICE_UUID";

/// Identity and credentials for the speech synthesis provider.
///
/// ```rust
/// use lipsync_rs::tts::SpeechConfig;
///
/// let config = SpeechConfig::builder()
///     .api_key("secret")
///     .voice_uuid("abcd1234")
///     .build()?;
/// assert_eq!(config.project_uuid, "9d6b821e");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default, setter(into))]
pub struct SpeechConfig {
    /// Provider API key. Synthesis is unavailable while this is unset or blank.
    #[builder(setter(into, strip_option))]
    pub api_key: Option<String>,
    pub project_uuid: String,
    pub voice_uuid: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_uuid: DEFAULT_PROJECT_UUID.to_string(),
            voice_uuid: DEFAULT_VOICE_UUID.to_string(),
        }
    }
}

impl SpeechConfig {
    pub fn builder() -> SpeechConfigBuilder {
        SpeechConfigBuilder::default()
    }

    /// Defaults overridden by any of the `RESEMBLE_*` environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let defaults = Self::default();
        Self {
            api_key: var(ENV_API_KEY),
            project_uuid: var(ENV_PROJECT_UUID).unwrap_or(defaults.project_uuid),
            voice_uuid: var(ENV_VOICE_UUID).unwrap_or(defaults.voice_uuid),
        }
    }
}
