//! Text front end: vowelization, grapheme-to-phoneme conversion and token ids.
//!
//! The acoustic models consume IPA phonemes produced by espeak-ng's Arabic
//! voice. An optional external vowelizer adds diacritics before
//! phonemization, which resolves most short-vowel ambiguity in undiacritized
//! Arabic.
//!
//! # System Requirements
//!
//! **espeak-ng** with Arabic data must be installed:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>

pub mod phonemizer;
pub mod vocab;
pub mod vowelizer;

pub use phonemizer::{EspeakConfig, EspeakPhonemizer};

use crate::error::TtsError;

/// Converts source text into a phoneme string.
pub trait PhonemeConverter: Send + Sync {
    /// Phonemize `text`, running it through `vowelizer` first when given.
    fn to_phonemes(&self, text: &str, vowelizer: Option<&str>) -> Result<String, TtsError>;

    /// Reduce a phoneme string to the form shown in reports.
    fn simplify(&self, phonemes: &str) -> String {
        simplify_phonemes(phonemes)
    }
}

/// Drop stress and tie marks and normalise word spacing.
pub fn simplify_phonemes(phonemes: &str) -> String {
    phonemes
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !matches!(c, 'ˈ' | 'ˌ' | '_' | '\u{0361}' | '\u{035C}'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::simplify_phonemes;

    #[test]
    fn strips_stress_marks_and_collapses_spaces() {
        assert_eq!(
            simplify_phonemes("ʔiʃtarˈakuː   fi  lqanˈaːt"),
            "ʔiʃtarakuː fi lqanaːt"
        );
    }

    #[test]
    fn keeps_length_marks_and_punctuation() {
        assert_eq!(simplify_phonemes("qaːla, ˈnaʕam"), "qaːla, naʕam");
    }
}
