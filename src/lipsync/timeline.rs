use serde::{Deserialize, Serialize};

use super::estimator::estimate_word;
use super::viseme::{lookup, Viseme, SILENCE_LABEL};

/// Speaking time assumed per word when the audio duration is unknown
/// (roughly 150 words per minute).
pub const SECONDS_PER_WORD: f64 = 0.4;

/// Duration of the placeholder event emitted for text without words.
pub const EMPTY_TEXT_DURATION: f64 = 0.5;

/// A single timed mouth shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisemeEvent {
    pub viseme: Viseme,
    #[serde(rename = "viseme_name")]
    pub name: &'static str,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl VisemeEvent {
    /// Event for `viseme`, with `name` filled from [`Viseme::name`].
    pub fn new(viseme: Viseme, start: f64, duration: f64) -> Self {
        Self {
            viseme,
            name: viseme.name(),
            start,
            duration,
        }
    }

    /// End time in seconds (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether `t` falls in the half-open interval `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end()
    }
}

/// A phoneme with exact boundaries, as produced by an external aligner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeSegment {
    #[serde(rename = "phoneme", default = "silence_label")]
    pub label: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
}

fn silence_label() -> String {
    SILENCE_LABEL.to_string()
}

impl PhonemeSegment {
    pub fn new(label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }
}

/// Heuristic speaking time for `text`: [`SECONDS_PER_WORD`] per word.
pub fn estimate_duration(text: &str) -> f64 {
    text.split_whitespace().count() as f64 * SECONDS_PER_WORD
}

/// Timeline built at the heuristic speaking rate, sent before audio exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisemePreview {
    pub visemes: Vec<VisemeEvent>,
    pub duration: f64,
}

/// Timeline for `text` at [`SECONDS_PER_WORD`], for clients that animate
/// before the real audio duration is known.
pub fn preview(text: &str) -> VisemePreview {
    let duration = estimate_duration(text);
    VisemePreview {
        visemes: from_text(text, Some(duration)),
        duration,
    }
}

/// Build a viseme timeline from plain text.
///
/// `total_duration` is spread evenly across words, then evenly across each
/// word's estimated visemes, so the event durations sum to `total_duration`.
/// When it is `None` (or not a usable non-negative number) the duration is
/// estimated from the word count.
pub fn from_text(text: &str, total_duration: Option<f64>) -> Vec<VisemeEvent> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![VisemeEvent::new(Viseme::Silence, 0.0, EMPTY_TEXT_DURATION)];
    }

    let total = match total_duration {
        Some(d) if d.is_finite() && d >= 0.0 => d,
        Some(d) => {
            log::warn!("Ignoring unusable duration {d}, estimating from word count");
            words.len() as f64 * SECONDS_PER_WORD
        }
        None => words.len() as f64 * SECONDS_PER_WORD,
    };
    let time_per_word = total / words.len() as f64;

    let mut events = Vec::with_capacity(words.len() * 4);
    let mut clock = 0.0;
    for word in words {
        let visemes = estimate_word(&word.to_lowercase());
        let time_per_viseme = time_per_word / visemes.len().max(1) as f64;

        for viseme in visemes {
            events.push(VisemeEvent::new(viseme, clock, time_per_viseme));
            clock += time_per_viseme;
        }
    }

    log::debug!(
        "Built {} viseme events over {:.3}s from text",
        events.len(),
        total
    );
    events
}

/// Convert an aligned phoneme sequence to visemes, one event per segment.
///
/// Order and start times are taken from the input, and each duration is
/// `end - start`. A segment whose end precedes its start is clamped to a
/// zero-length event rather than a negative duration.
pub fn from_phonemes(segments: &[PhonemeSegment]) -> Vec<VisemeEvent> {
    segments
        .iter()
        .map(|segment| {
            let viseme = lookup(&segment.label.to_lowercase());
            let duration = segment.end - segment.start;
            if duration < 0.0 {
                log::warn!(
                    "Phoneme {:?} ends before it starts ({} < {})",
                    segment.label,
                    segment.end,
                    segment.start
                );
            }
            VisemeEvent::new(viseme, segment.start, duration.max(0.0))
        })
        .collect()
}

/// The viseme showing at time `t`, or silence outside every event.
///
/// Events are scanned in order and the first match wins.
pub fn viseme_at(timeline: &[VisemeEvent], t: f64) -> Viseme {
    timeline
        .iter()
        .find(|event| event.contains(t))
        .map(|event| event.viseme)
        .unwrap_or(Viseme::Silence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(events: &[VisemeEvent]) -> f64 {
        events.iter().map(|e| e.duration).sum()
    }

    #[test]
    fn empty_text_yields_single_silence() {
        for text in ["", "   ", "\n\t"] {
            assert_eq!(
                from_text(text, None),
                vec![VisemeEvent::new(Viseme::Silence, 0.0, 0.5)]
            );
        }
        assert_eq!(from_text("", Some(3.0)).len(), 1);
    }

    #[test]
    fn durations_sum_to_requested_total() {
        let texts = [
            "hello",
            "Hello, world!",
            "the quick brown fox jumps over the lazy dog",
            "  spaced   out\twords \n here ",
        ];
        for text in texts {
            for d in [0.1, 1.0, 2.75, 13.37] {
                let events = from_text(text, Some(d));
                let sum = total(&events);
                assert!(
                    ((sum - d) / d).abs() < 1e-6,
                    "{text:?} with {d}: got {sum}"
                );
            }
        }
    }

    #[test]
    fn events_are_ordered_and_contiguous() {
        let events = from_text("mama papa", Some(2.0));
        let mut clock = 0.0;
        for event in &events {
            assert!((event.start - clock).abs() < 1e-9);
            assert!(event.duration >= 0.0);
            clock = event.end();
        }
        assert!((clock - 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_duration_is_estimated_per_word() {
        let events = from_text("one two three", None);
        assert!((total(&events) - 1.2).abs() < 1e-9);
        assert!((estimate_duration("one two three") - 1.2).abs() < 1e-12);
    }

    #[test]
    fn preview_uses_word_rate() {
        let preview = preview("speak these four words");
        assert!((preview.duration - 1.6).abs() < 1e-12);
        assert_eq!(preview.visemes, from_text("speak these four words", None));
    }

    #[test]
    fn negative_duration_falls_back_to_estimate() {
        let events = from_text("one two", Some(-1.0));
        assert!((total(&events) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn each_word_gets_equal_time() {
        // "a" has one viseme, "hello" has six; both get half of the total.
        let events = from_text("a hello", Some(1.0));
        assert_eq!(events.len(), 7);
        assert!((events[0].duration - 0.5).abs() < 1e-12);
        assert!((events[1].start - 0.5).abs() < 1e-12);
        assert!((events[1].duration - 0.5 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn words_are_lowercased_before_estimation() {
        let upper = from_text("MOVE", Some(1.0));
        let lower = from_text("move", Some(1.0));
        assert_eq!(upper, lower);
    }

    #[test]
    fn converts_phonemes_one_to_one() {
        let segments: Vec<PhonemeSegment> = serde_json::from_str(
            r#"[{"phoneme":"m","start":0.0,"end":0.2},{"phoneme":"aa","start":0.2,"end":0.5}]"#,
        )
        .unwrap();
        let events = from_phonemes(&segments);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].viseme, Viseme::Closed);
        assert_eq!(events[0].start, 0.0);
        assert!((events[0].duration - 0.2).abs() < 1e-12);
        assert_eq!(events[1].viseme, Viseme::Open);
        assert_eq!(events[1].start, 0.2);
        assert!((events[1].duration - 0.3).abs() < 1e-12);
    }

    #[test]
    fn phoneme_labels_are_case_insensitive() {
        let events = from_phonemes(&[PhonemeSegment::new("SH", 0.0, 0.1)]);
        assert_eq!(events[0].viseme, Viseme::Teeth);
        assert_eq!(events[0].name, "teeth");
    }

    #[test]
    fn phoneme_fields_have_defaults() {
        let segment: PhonemeSegment = serde_json::from_str("{}").unwrap();
        assert_eq!(segment, PhonemeSegment::new("sil", 0.0, 0.0));
        let events = from_phonemes(&[segment]);
        assert_eq!(events, vec![VisemeEvent::new(Viseme::Silence, 0.0, 0.0)]);
    }

    #[test]
    fn inverted_segment_is_clamped() {
        let events = from_phonemes(&[PhonemeSegment::new("f", 0.5, 0.4)]);
        assert_eq!(events[0].duration, 0.0);
    }

    #[test]
    fn serializes_with_viseme_name() {
        let json = serde_json::to_value(VisemeEvent::new(Viseme::Closed, 0.25, 0.5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "viseme": 5,
                "viseme_name": "closed",
                "start": 0.25,
                "duration": 0.5
            })
        );
    }

    #[test]
    fn viseme_at_uses_half_open_intervals() {
        let timeline = vec![
            VisemeEvent::new(Viseme::Closed, 0.0, 0.2),
            VisemeEvent::new(Viseme::Open, 0.2, 0.3),
        ];
        assert_eq!(viseme_at(&timeline, 0.1), Viseme::Closed);
        assert_eq!(viseme_at(&timeline, 0.2), Viseme::Open);
        assert_eq!(viseme_at(&timeline, 0.35), Viseme::Open);
        assert_eq!(viseme_at(&timeline, 0.5), Viseme::Silence);
        assert_eq!(viseme_at(&timeline, -0.1), Viseme::Silence);
        assert_eq!(viseme_at(&timeline, 10.0), Viseme::Silence);
        assert_eq!(viseme_at(&[], 0.0), Viseme::Silence);
    }

    #[test]
    fn viseme_at_reports_gaps_as_silence() {
        let timeline = vec![
            VisemeEvent::new(Viseme::Round, 0.0, 0.1),
            VisemeEvent::new(Viseme::Teeth, 0.3, 0.1),
        ];
        assert_eq!(viseme_at(&timeline, 0.2), Viseme::Silence);
        assert_eq!(viseme_at(&timeline, 0.35), Viseme::Teeth);
    }

    #[test]
    fn viseme_at_returns_first_match_in_order() {
        let timeline = vec![
            VisemeEvent::new(Viseme::Smile, 0.0, 1.0),
            VisemeEvent::new(Viseme::Pursed, 0.5, 1.0),
        ];
        assert_eq!(viseme_at(&timeline, 0.75), Viseme::Smile);
    }
}
