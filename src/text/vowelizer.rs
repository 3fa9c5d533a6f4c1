use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::TtsError;

/// Add diacritics to `text` with an external vowelizer.
///
/// `name` is an executable (looked up on `PATH` unless it is a path) that
/// reads undiacritized text on stdin and writes the vowelized text on stdout.
pub fn vowelize(name: &str, text: &str) -> Result<String, TtsError> {
    let failed = |reason: String| TtsError::VowelizerFailed {
        name: name.to_string(),
        reason,
    };

    let mut child = Command::new(name)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| failed(format!("could not start: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| failed(format!("could not write input: {e}")))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| failed(format!("did not finish: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failed(format!(
            "exited with code {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    let vowelized = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if vowelized.is_empty() {
        return Err(failed("produced no output".to_string()));
    }
    log::debug!("Vowelized with {name}: {vowelized}");
    Ok(vowelized)
}

#[cfg(all(test, unix))]
mod tests {
    use super::vowelize;
    use crate::error::TtsError;

    #[test]
    fn passes_text_through_the_command() {
        // `cat` echoes stdin, standing in for a real vowelizer.
        assert_eq!(vowelize("cat", "في القناة\n").unwrap(), "في القناة");
    }

    #[test]
    fn missing_executable_is_a_vowelizer_error() {
        let err = vowelize("definitely-not-a-vowelizer", "نص").unwrap_err();
        match err {
            TtsError::VowelizerFailed { name, .. } => {
                assert_eq!(name, "definitely-not-a-vowelizer")
            }
            other => panic!("expected VowelizerFailed, got {other:?}"),
        }
    }

    #[test]
    fn empty_output_is_rejected() {
        assert!(matches!(
            vowelize("true", "نص"),
            Err(TtsError::VowelizerFailed { .. })
        ));
    }
}
