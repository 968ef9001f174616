use std::io::Cursor;
use std::time::Instant;

use lipsync_rs::{
    lipsync::{self, from_phonemes, viseme_at, PhonemeSegment},
    tts::{SpeakRequest, SpeechConfig, SpeechManager, UpstreamError},
    SynthesisBackend, SynthesisRequest,
};

const SAMPLE_RATE: u32 = 16000;

/// Offline stand-in for a real provider: writes a quiet WAV whose length
/// follows the word count.
struct ToneBackend;

impl SynthesisBackend for ToneBackend {
    fn provider(&self) -> &str {
        "offline-tone"
    }

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Vec<u8>, UpstreamError> {
        let seconds = lipsync::estimate_duration(request.text).max(0.5);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| UpstreamError::Provider(e.to_string()))?;
        for i in 0..(seconds * SAMPLE_RATE as f64) as usize {
            let t = i as f32 / SAMPLE_RATE as f32;
            let sample = (t * 220.0 * std::f32::consts::TAU).sin() * 2000.0;
            writer
                .write_sample(sample as i16)
                .map_err(|e| UpstreamError::Provider(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| UpstreamError::Provider(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = SpeechConfig::from_env();
    if config.api_key.is_none() {
        config.api_key = Some("offline".to_string());
    }
    let manager = SpeechManager::new(config, ToneBackend)?;

    let text = "Hello! I am your virtual assistant. Ask me anything about the documents.";

    let start = Instant::now();
    let response = manager.speak(&SpeakRequest::new(text))?;
    println!(
        "First request: {:.2}s of audio in {:.2?}",
        response.duration.unwrap_or_default(),
        start.elapsed()
    );

    let start = Instant::now();
    manager.speak(&SpeakRequest::new(text))?;
    println!("Cached request in {:.2?}", start.elapsed());

    let visemes = response.visemes.unwrap_or_default();
    println!("{} viseme events", visemes.len());
    for t in [0.0, 0.5, 1.0, 2.5] {
        println!("  t={t:.1}s -> {}", viseme_at(&visemes, t));
    }

    let aligned: Vec<PhonemeSegment> = serde_json::from_str(
        r#"[
            {"phoneme": "hh", "start": 0.00, "end": 0.08},
            {"phoneme": "ah", "start": 0.08, "end": 0.18},
            {"phoneme": "l",  "start": 0.18, "end": 0.26},
            {"phoneme": "ow", "start": 0.26, "end": 0.45},
            {"start": 0.45, "end": 0.60}
        ]"#,
    )?;
    println!(
        "Aligned path: {}",
        serde_json::to_string_pretty(&from_phonemes(&aligned))?
    );

    println!("Status: {}", serde_json::to_string(&manager.status())?);
    manager.clear_cache();
    Ok(())
}
