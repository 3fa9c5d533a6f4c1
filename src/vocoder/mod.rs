//! Mel-spectrogram to waveform conversion.
//!
//! Every acoustic model feeds the same vocoder; the only contract between
//! them is the mel layout `[freq_bins, frames]` with `freq_bins == num_mels`.

pub mod denoiser;
#[cfg(feature = "onnx")]
pub mod hifigan;
pub mod stft;

pub use denoiser::Denoiser;
#[cfg(feature = "onnx")]
pub use hifigan::HifiGan;

use std::path::Path;

use serde::Deserialize;

use crate::audio::{MelSpectrogram, Waveform, N_MELS, SAMPLE_RATE};
use crate::device::Device;
use crate::error::TtsError;

/// A loaded neural vocoder.
pub trait Vocoder {
    fn device(&self) -> Device;

    fn sample_rate(&self) -> u32;

    /// Mel bins expected on input.
    fn num_mels(&self) -> usize;

    /// Render `mel` to audio of shape `[1, channels, samples]`.
    fn infer(&mut self, mel: &MelSpectrogram) -> Result<Waveform, TtsError>;
}

/// The subset of a HiFi-GAN `config.json` used at inference time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HifiGanConfig {
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,
    #[serde(default = "default_num_mels")]
    pub num_mels: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
}

fn default_sampling_rate() -> u32 {
    SAMPLE_RATE
}

fn default_num_mels() -> usize {
    N_MELS
}

fn default_hop_size() -> usize {
    256
}

impl HifiGanConfig {
    /// Parse a HiFi-GAN training config. Unknown fields are ignored.
    pub fn load(path: &Path) -> Result<Self, TtsError> {
        if !path.exists() {
            return Err(TtsError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TtsError::Config(format!("{}: {e}", path.display())))?;
        if config.num_mels == 0 || config.hop_size == 0 {
            return Err(TtsError::Config(format!(
                "{}: num_mels and hop_size must be positive",
                path.display()
            )));
        }
        Ok(config)
    }
}

/// Check a mel against the vocoder's expected bin count.
pub fn check_mel_bins(mel: &MelSpectrogram, num_mels: usize) -> Result<(), TtsError> {
    if mel.freq_bins() != num_mels {
        return Err(TtsError::ShapeMismatch {
            expected: format!("[{num_mels}, frames]"),
            found: format!("[{}, {}]", mel.freq_bins(), mel.frames()),
        });
    }
    Ok(())
}
