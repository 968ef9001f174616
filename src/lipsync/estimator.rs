use super::viseme::Viseme;

/// Words longer than this get a silence inserted at their midpoint.
const MID_WORD_PAUSE_THRESHOLD: usize = 3;

/// Guess the viseme sequence for a single lowercase word.
///
/// This is a character-level rule set used when no phoneme alignment is
/// available. Always returns at least one viseme; an empty word yields
/// `[Silence]`.
pub fn estimate_word(word: &str) -> Vec<Viseme> {
    let mut visemes: Vec<Viseme> = word.chars().map(char_viseme).collect();

    // Brief articulatory pause in the middle of longer words.
    if visemes.len() > MID_WORD_PAUSE_THRESHOLD {
        visemes.insert(visemes.len() / 2, Viseme::Silence);
    }

    if visemes.is_empty() {
        visemes.push(Viseme::Silence);
    }
    visemes
}

fn char_viseme(ch: char) -> Viseme {
    match ch {
        'a' | 'e' => Viseme::Open,
        'i' => Viseme::Smile,
        'o' => Viseme::Round,
        'u' => Viseme::Pursed,
        'm' | 'b' | 'p' => Viseme::Closed,
        'f' | 'v' => Viseme::TeethLip,
        's' | 'z' | 't' | 'h' => Viseme::Teeth,
        // Neutral open for every other consonant, digit or symbol.
        _ => Viseme::Open,
    }
}
