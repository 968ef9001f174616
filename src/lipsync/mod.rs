//! Viseme timelines for avatar lip sync.
//!
//! Two paths produce a timeline:
//!
//! - **Text** ([`from_text`]): a cheap character-level estimator guesses the
//!   mouth shapes of each word and the total duration (the real audio length
//!   when known, `0.4s` per word otherwise) is spread evenly across them.
//! - **Phonemes** ([`from_phonemes`]): when an external aligner supplies
//!   phoneme boundaries, each segment maps 1:1 to a viseme.
//!
//! # Viseme Set
//!
//! | Id | Name | Sounds |
//! |---|---|---|
//! | 0 | `silence` | pauses, unknown |
//! | 1 | `open` | A, E |
//! | 2 | `smile` | I |
//! | 3 | `round` | O |
//! | 4 | `pursed` | U |
//! | 5 | `closed` | M, B, P |
//! | 6 | `teeth_lip` | F, V |
//! | 7 | `teeth` | Th, S, Z |
//!
//! # Example
//!
//! ```rust
//! use lipsync_rs::lipsync::{from_text, viseme_at, Viseme};
//!
//! let timeline = from_text("Hello world", Some(1.5));
//! assert_eq!(viseme_at(&timeline, 0.0), Viseme::Teeth);
//! assert_eq!(viseme_at(&timeline, 2.0), Viseme::Silence);
//! ```

pub mod estimator;
pub mod timeline;
pub mod viseme;

pub use estimator::estimate_word;
pub use timeline::{
    estimate_duration, from_phonemes, from_text, preview, viseme_at, PhonemeSegment, VisemeEvent,
    VisemePreview,
};
pub use viseme::{lookup, Viseme};
