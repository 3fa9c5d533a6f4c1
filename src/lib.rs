//! # arabic-tts
//!
//! Arabic text-to-speech inference: text is phonemized, turned into a
//! mel-spectrogram by a pluggable acoustic model, rendered to audio by a
//! shared HiFi-GAN vocoder and optionally denoised.
//!
//! ## Features
//!
//! - **Pluggable acoustic models**: FastPitch (parallel) and Tacotron 2
//!   (autoregressive) behind one [`AcousticModel`](engines::AcousticModel) trait
//! - **Shared vocoder**: every backend feeds the same HiFi-GAN
//! - **Denoising**: spectral subtraction of the vocoder's bias
//! - **Reports**: WAV, spectrogram PNG and an HTML page per run
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! arabic-tts = { version = "2026.10", features = ["onnx"] }
//! ```
//!
//! ```ignore
//! use std::sync::Arc;
//! use arabic_tts::{
//!     engines::BackendRegistry, onnx::SessionParams, report::ArtifactWriter, BasicConfig,
//!     ConfigResolver, EspeakPhonemizer, ModelKind, SynthesisPipeline, SynthesisRequestBuilder,
//! };
//!
//! let phonemizer = Arc::new(EspeakPhonemizer::default());
//! let backends = BackendRegistry::onnx(phonemizer.clone(), SessionParams::default());
//! let resolver = ConfigResolver::with_defaults(BasicConfig::default());
//!
//! let request = SynthesisRequestBuilder::default()
//!     .text("اشتركوا في القناة")
//!     .model(ModelKind::FastPitch)
//!     .checkpoint_path("pretrained/fastpitch_ar_adv.onnx")
//!     .build()?;
//!
//! let result = SynthesisPipeline::new(&backends, &resolver, phonemizer.as_ref()).run(&request)?;
//! ArtifactWriter::new("samples/test").write(&result, request.text())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod device;
pub mod engines;
pub mod error;
pub mod inference;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pipeline;
pub mod playback;
pub mod report;
pub mod request;
pub mod text;
pub mod vocoder;

pub use audio::{MelSpectrogram, Waveform, SAMPLE_RATE};
pub use config::{BasicConfig, ConfigResolver, VocoderConfig};
pub use device::{Device, DevicePreference};
pub use error::{PlaybackError, TtsError};
pub use inference::InferenceMode;
pub use pipeline::{PipelineState, SynthesisPipeline};
pub use request::{ModelKind, SynthesisRequest, SynthesisRequestBuilder};
pub use text::{EspeakPhonemizer, PhonemeConverter};

use std::path::Path;

/// The outcome of one synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Mel-spectrogram `[freq_bins, frames]` produced by the acoustic model
    pub mel: MelSpectrogram,
    /// Final audio `[1, channels, samples]`, denoised if requested
    pub wave: Waveform,
    /// Sample rate of `wave` (22050 for the shipped vocoder)
    pub sample_rate: u32,
    /// Phonemes of the input text as produced by the converter
    pub phonemes_raw: String,
    /// Simplified phonemes for display
    pub phonemes_display: String,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), TtsError> {
        let spec = hound::WavSpec {
            channels: self.wave.channels() as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for sample in self.wave.interleaved() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.wave.duration_secs(self.sample_rate)
    }
}
