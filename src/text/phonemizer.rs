use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::vowelizer::vowelize;
use super::PhonemeConverter;
use crate::error::TtsError;

/// espeak-ng voice used for Arabic phonemization.
pub const ARABIC_VOICE: &str = "ar";

/// Location of the espeak-ng binary and data. `None` uses the system default.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

/// Arabic grapheme-to-phoneme conversion via espeak-ng.
#[derive(Debug, Clone, Default)]
pub struct EspeakPhonemizer {
    espeak: EspeakConfig,
}

impl EspeakPhonemizer {
    pub fn new(espeak: EspeakConfig) -> Self {
        Self { espeak }
    }
}

impl PhonemeConverter for EspeakPhonemizer {
    fn to_phonemes(&self, text: &str, vowelizer: Option<&str>) -> Result<String, TtsError> {
        let text = match vowelizer {
            Some(name) => Cow::Owned(vowelize(name, text)?),
            None => Cow::Borrowed(text),
        };
        phonemize(&text, &self.espeak)
    }
}

/// Convert text to an IPA phoneme string, words separated by single spaces.
///
/// Sentence punctuation is carried through unchanged (Arabic comma, semicolon
/// and question mark are mapped to their Latin forms) so the acoustic model
/// sees phrase boundaries.
pub fn phonemize(text: &str, espeak: &EspeakConfig) -> Result<String, TtsError> {
    let parts = split_text_parts(text);
    if parts.is_empty() {
        return Ok(String::new());
    }

    let text_segments: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            TextPart::Text(segment) => Some(segment.as_str()),
            TextPart::Punct(_) => None,
        })
        .collect();

    let segment_ipa = if text_segments.is_empty() {
        Vec::new()
    } else {
        phonemize_segments_batch(&text_segments, espeak)?
    };

    let mut phonemes = String::new();
    let mut segment_index = 0usize;
    for part in parts {
        match part {
            TextPart::Text(_) => {
                if let Some(ipa) = segment_ipa.get(segment_index) {
                    if !phonemes.is_empty() && !phonemes.ends_with(' ') {
                        phonemes.push(' ');
                    }
                    phonemes.push_str(ipa);
                }
                segment_index += 1;
            }
            TextPart::Punct(ch) => phonemes.push(ch),
        }
    }

    Ok(phonemes.trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextPart {
    Text(String),
    Punct(char),
}

fn split_text_parts(text: &str) -> Vec<TextPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for (idx, ch) in text.char_indices() {
        let ch_len = ch.len_utf8();
        if let Some(punct) = map_boundary_punctuation(ch) {
            if !is_numeric_connector_between_digits(text, idx, ch_len, ch) {
                flush_text_part(&mut parts, &mut current);
                parts.push(TextPart::Punct(punct));
                continue;
            }
        }

        if ch.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }

        current.push(ch);
    }

    flush_text_part(&mut parts, &mut current);
    parts
}

fn flush_text_part(parts: &mut Vec<TextPart>, current: &mut String) {
    let trimmed = current.trim();
    if trimmed.is_empty() {
        current.clear();
        return;
    }
    parts.push(TextPart::Text(trimmed.to_string()));
    current.clear();
}

fn map_boundary_punctuation(ch: char) -> Option<char> {
    match ch {
        '.' | '!' | '?' | ',' | ';' | ':' => Some(ch),
        '\u{060C}' => Some(','), // ،
        '\u{061B}' => Some(';'), // ؛
        '\u{061F}' => Some('?'), // ؟
        '\u{06D4}' => Some('.'), // ۔
        '\n' | '\r' => Some('.'),
        _ => None,
    }
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit() || ('\u{0660}'..='\u{0669}').contains(&ch)
}

fn is_numeric_connector_between_digits(text: &str, idx: usize, ch_len: usize, ch: char) -> bool {
    if !matches!(ch, '.' | ',' | '\u{060C}') {
        return false;
    }

    let prev = text[..idx].chars().next_back();
    let next = text[idx + ch_len..].chars().next();

    matches!(
        (prev, next),
        (Some(left), Some(right)) if is_digit(left) && is_digit(right)
    )
}

fn phonemize_segments_batch(
    segments: &[&str],
    espeak: &EspeakConfig,
) -> Result<Vec<String>, TtsError> {
    let batched_input = segments.join("\n");
    let output = run_espeak(&batched_input, espeak)?;
    let lines: Vec<&str> = output.lines().collect();

    // espeak-ng should emit one line per input line for stdin mode.
    // If this assumption breaks, fall back to per-segment invocation.
    if lines.len() != segments.len() {
        return segments
            .iter()
            .map(|segment| Ok(clean_ipa(&run_espeak(segment, espeak)?)))
            .collect();
    }

    Ok(lines.iter().map(|line| clean_ipa(line)).collect())
}

fn run_espeak(input: &str, espeak: &EspeakConfig) -> Result<String, TtsError> {
    let bin = espeak
        .bin_path
        .as_deref()
        .map(|p| p.as_os_str())
        .unwrap_or_else(|| "espeak-ng".as_ref());

    let mut command = Command::new(bin);
    command.args(["--ipa", "--stdin", "-q", "-v", ARABIC_VOICE]);
    if let Some(data) = &espeak.data_path {
        command.arg(format!("--path={}", data.display()));
    }

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TtsError::EspeakNotFound
            } else {
                TtsError::Io(e)
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // stdin is line-oriented; an unterminated last line can lose its final token.
        let stdin_payload = canonicalize_espeak_stdin_payload(input);
        stdin.write_all(stdin_payload.as_bytes())?;
    }

    let output = child.wait_with_output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TtsError::PhonemizerFailed(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn canonicalize_espeak_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Join espeak output lines into one segment, dropping its `_` pause markers.
fn clean_ipa(ipa: &str) -> String {
    ipa.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(|line| line.split_whitespace())
        .map(|word| word.replace('_', ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
