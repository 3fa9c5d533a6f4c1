use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::TtsError;

/// Phoneme-to-token table used by an acoustic model.
pub type Vocab = HashMap<char, i64>;

/// Load a vocabulary from a JSON file with a `"vocab"` object mapping
/// single-character strings to integer token ids.
pub fn load_vocab(config_path: &Path) -> Result<Vocab, TtsError> {
    let content = std::fs::read_to_string(config_path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| TtsError::Config(format!("Failed to parse JSON: {e}")))?;

    let vocab_obj = json
        .get("vocab")
        .ok_or_else(|| TtsError::Config("Missing 'vocab' field".to_string()))?
        .as_object()
        .ok_or_else(|| TtsError::Config("'vocab' must be an object".to_string()))?;

    let mut map = HashMap::new();
    for (k, v) in vocab_obj {
        let ch = k
            .chars()
            .next()
            .ok_or_else(|| TtsError::Config(format!("Empty key in vocab: {k:?}")))?;
        let id = v
            .as_i64()
            .ok_or_else(|| TtsError::Config(format!("Non-integer vocab value for key {k:?}")))?;
        map.insert(ch, id);
    }

    Ok(map)
}

/// Where a checkpoint keeps its vocabulary: `config.json` inside a checkpoint
/// directory, or `<stem>.json` next to a single-file checkpoint.
pub fn vocab_path_for(checkpoint: &Path) -> PathBuf {
    if checkpoint.is_dir() {
        checkpoint.join("config.json")
    } else {
        checkpoint.with_extension("json")
    }
}

/// The checkpoint's vocabulary if it ships one, else [`hardcoded_vocab`].
pub fn vocab_for_checkpoint(checkpoint: &Path) -> Result<Vocab, TtsError> {
    let path = vocab_path_for(checkpoint);
    if path.exists() {
        log::info!("Loading vocab from {}", path.display());
        load_vocab(&path)
    } else {
        log::warn!("{} not found, using hardcoded vocab", path.display());
        Ok(hardcoded_vocab())
    }
}

/// Map a phoneme string to token ids. Characters outside the vocabulary are
/// dropped.
pub fn encode(phonemes: &str, vocab: &Vocab) -> Vec<i64> {
    let mut ids = Vec::with_capacity(phonemes.len());
    for ch in phonemes.chars() {
        match vocab.get(&ch) {
            Some(&id) => ids.push(id),
            None => log::trace!("Dropping out-of-vocabulary phoneme {ch:?}"),
        }
    }
    ids
}

/// Built-in Arabic IPA vocabulary.
///
/// Only used when a checkpoint ships no vocabulary file. Id 0 is reserved
/// for padding.
pub fn hardcoded_vocab() -> Vocab {
    let entries: &[(char, i64)] = &[
        (' ', 1),
        ('.', 2),
        (',', 3),
        ('?', 4),
        ('!', 5),
        (';', 6),
        (':', 7),
        // consonants
        ('ʔ', 10),
        ('b', 11),
        ('t', 12),
        ('θ', 13),
        ('ʒ', 14),
        ('d', 15),
        ('ʤ', 16),
        ('ħ', 17),
        ('x', 18),
        ('ð', 19),
        ('r', 20),
        ('z', 21),
        ('s', 22),
        ('ʃ', 23),
        ('ˤ', 24),
        ('ʕ', 25),
        ('ɣ', 26),
        ('f', 27),
        ('q', 28),
        ('k', 29),
        ('l', 30),
        ('m', 31),
        ('n', 32),
        ('h', 33),
        ('w', 34),
        ('j', 35),
        ('ɡ', 36),
        ('g', 36),
        ('v', 37),
        ('p', 38),
        ('ɫ', 39),
        ('χ', 40),
        ('ʁ', 41),
        // vowels
        ('a', 50),
        ('i', 51),
        ('u', 52),
        ('e', 53),
        ('o', 54),
        ('ɑ', 55),
        ('æ', 56),
        ('ɐ', 57),
        ('ə', 58),
        ('ɪ', 59),
        ('ʊ', 60),
        ('ɛ', 61),
        ('ɔ', 62),
        // suprasegmentals
        ('ː', 70),
        ('ˈ', 71),
        ('ˌ', 72),
        ('ʲ', 73),
        ('ʷ', 74),
    ];
    entries.iter().copied().collect()
}
