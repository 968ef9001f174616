use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Label used for silence when an aligner omits the phoneme field.
pub const SILENCE_LABEL: &str = "sil";

/// One of the 8 mouth shapes an avatar can display.
///
/// The discriminant is the stable wire id sent to animation clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Viseme {
    #[default]
    Silence = 0,
    /// A and E sounds.
    Open = 1,
    /// I sounds.
    Smile = 2,
    /// O sounds.
    Round = 3,
    /// U sounds.
    Pursed = 4,
    /// M, B and P.
    Closed = 5,
    /// F and V.
    TeethLip = 6,
    /// Th, S and Z.
    Teeth = 7,
}

impl Viseme {
    /// All visemes in id order.
    pub const ALL: [Viseme; 8] = [
        Viseme::Silence,
        Viseme::Open,
        Viseme::Smile,
        Viseme::Round,
        Viseme::Pursed,
        Viseme::Closed,
        Viseme::TeethLip,
        Viseme::Teeth,
    ];

    /// Stable wire id in `0..=7`.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Display name used in the `viseme_name` field of serialized events.
    pub fn name(self) -> &'static str {
        match self {
            Viseme::Silence => "silence",
            Viseme::Open => "open",
            Viseme::Smile => "smile",
            Viseme::Round => "round",
            Viseme::Pursed => "pursed",
            Viseme::Closed => "closed",
            Viseme::TeethLip => "teeth_lip",
            Viseme::Teeth => "teeth",
        }
    }
}

impl From<Viseme> for u8 {
    fn from(viseme: Viseme) -> Self {
        viseme.id()
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Viseme id {0} is out of range (expected 0-7)")]
pub struct InvalidVisemeId(pub u8);

impl TryFrom<u8> for Viseme {
    type Error = InvalidVisemeId;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Viseme::ALL
            .get(id as usize)
            .copied()
            .ok_or(InvalidVisemeId(id))
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static PHONEME_TABLE: Lazy<HashMap<&'static str, Viseme>> = Lazy::new(phoneme_table);

/// Map an ARPAbet-style phoneme label to its viseme.
///
/// The lookup is total: empty, unknown and pause labels all map to
/// [`Viseme::Silence`]. Labels are matched as given; callers lowercase first.
pub fn lookup(label: &str) -> Viseme {
    PHONEME_TABLE.get(label).copied().unwrap_or(Viseme::Silence)
}

/// Hardcoded phoneme-to-viseme table.
fn phoneme_table() -> HashMap<&'static str, Viseme> {
    use Viseme::*;

    let entries: &[(&str, Viseme)] = &[
        (SILENCE_LABEL, Silence),
        ("pau", Silence),
        // Open-mouth vowels
        ("aa", Open),
        ("ae", Open),
        ("ah", Open),
        ("aw", Open),
        ("ay", Open),
        ("eh", Open),
        ("ey", Open),
        // Smile vowels
        ("er", Smile),
        ("ih", Smile),
        ("iy", Smile),
        // Round vowels
        ("ao", Round),
        ("ow", Round),
        ("oy", Round),
        // Pursed vowels
        ("uh", Pursed),
        ("uw", Pursed),
        // Bilabials
        ("b", Closed),
        ("m", Closed),
        ("p", Closed),
        // Labiodentals
        ("f", TeethLip),
        ("v", TeethLip),
        // Dentals and sibilants
        ("dh", Teeth),
        ("th", Teeth),
        ("s", Teeth),
        ("z", Teeth),
        ("sh", Teeth),
        ("zh", Teeth),
        // Remaining consonants
        ("d", Open),
        ("g", Open),
        ("k", Open),
        ("l", Open),
        ("n", Open),
        ("r", Smile),
        ("t", Open),
        ("w", Pursed),
        ("y", Smile),
        ("ch", Teeth),
        ("jh", Teeth),
        ("ng", Open),
        ("hh", Open),
    ];
    entries.iter().copied().collect()
}
