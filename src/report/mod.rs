//! Persisting a synthesis result: audio, spectrogram image and HTML report.

pub mod html;
pub mod plot;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::TtsError;
use crate::SynthesisResult;

pub const WAVE_FILE: &str = "wave.wav";
pub const MEL_FILE: &str = "mel_spec.png";
pub const REPORT_FILE: &str = "index.html";

/// Volume the report's audio player starts at.
const REPORT_VOLUME: f32 = 0.42;

/// Writes `wave.wav`, `mel_spec.png` and `index.html` into one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Create the output directory if needed and write all artifacts.
    pub fn write(&self, result: &SynthesisResult, text: &str) -> Result<(), TtsError> {
        if !self.out_dir.exists() {
            std::fs::create_dir_all(&self.out_dir)?;
            log::info!("Created folder: {}", self.out_dir.display());
        }

        result.write_wav(&self.out_dir.join(WAVE_FILE))?;
        plot::spectrogram_image(&result.mel).save(self.out_dir.join(MEL_FILE))?;
        self.write_report(text, &result.phonemes_display)?;

        log::info!(
            "Saved {:.2}s sample to: {}",
            result.duration_secs(),
            self.out_dir.display()
        );
        Ok(())
    }

    fn write_report(&self, text: &str, phonemes: &str) -> Result<(), TtsError> {
        let mut f = BufWriter::new(File::create(self.out_dir.join(REPORT_FILE))?);
        f.write_all(html::html_start().as_bytes())?;
        f.write_all(html::heading("Test sample", 1).as_bytes())?;
        f.write_all(html::sample_entry(&format!("./{WAVE_FILE}"), text, phonemes).as_bytes())?;
        f.write_all(html::heading("Spectrogram", 2).as_bytes())?;
        f.write_all(html::img(&format!("./{MEL_FILE}")).as_bytes())?;
        f.write_all(html::volume_script(REPORT_VOLUME).as_bytes())?;
        f.write_all(html::html_end().as_bytes())?;
        f.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MelSpectrogram, Waveform};
    use ndarray::{Array2, Array3};

    fn result(channels: usize) -> SynthesisResult {
        SynthesisResult {
            mel: MelSpectrogram::new(Array2::from_shape_fn((80, 20), |(f, t)| (f * t) as f32)),
            wave: Waveform::new(Array3::from_shape_fn((1, channels, 5_120), |(_, c, i)| {
                (i as f32 * 0.05 + c as f32).sin() * 0.5
            }))
            .unwrap(),
            sample_rate: 22_050,
            phonemes_raw: "ʔiʃtarˈakuː".to_string(),
            phonemes_display: "ʔiʃtarakuː".to_string(),
        }
    }

    #[test]
    fn writes_all_artifacts_into_a_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("samples").join("test");
        let writer = ArtifactWriter::new(&out_dir);

        writer.write(&result(1), "اشتركوا في القناة").unwrap();

        let reader = hound::WavReader::open(out_dir.join(WAVE_FILE)).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 5_120);

        let png = image::open(out_dir.join(MEL_FILE)).unwrap();
        assert!(png.width() > 0 && png.height() > 0);

        let html = std::fs::read_to_string(out_dir.join(REPORT_FILE)).unwrap();
        assert!(html.contains("./wave.wav"));
        assert!(html.contains("./mel_spec.png"));
        assert!(html.contains("اشتركوا في القناة"));
        assert!(html.contains("ʔiʃtarakuː"));
    }

    #[test]
    fn stereo_audio_keeps_its_channels() {
        let dir = tempfile::tempdir().unwrap();
        ArtifactWriter::new(dir.path()).write(&result(2), "نص").unwrap();

        let reader = hound::WavReader::open(dir.path().join(WAVE_FILE)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 5_120);
    }
}
