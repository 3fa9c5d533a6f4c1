//! One end-to-end synthesis run as driven by the command line.

use std::path::PathBuf;
use std::time::Instant;

use crate::config::ConfigResolver;
use crate::device::DevicePreference;
use crate::engines::BackendRegistry;
use crate::error::TtsError;
use crate::pipeline::SynthesisPipeline;
use crate::playback;
use crate::report::ArtifactWriter;
use crate::request::{ModelKind, SynthesisRequest, SynthesisRequestBuilder};
use crate::text::PhonemeConverter;
use crate::SynthesisResult;

/// Raw options of a run, before validation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub text: String,
    /// Model name as typed by the user.
    pub model: String,
    pub checkpoint: PathBuf,
    pub vocoder_sd: Option<PathBuf>,
    pub vocoder_config: Option<PathBuf>,
    pub denoise: f32,
    pub out_dir: PathBuf,
    pub vowelizer: Option<String>,
    pub cpu: bool,
    pub play: bool,
}

impl RunOptions {
    /// Validate into a request. Touches no files.
    pub fn request(&self) -> Result<SynthesisRequest, TtsError> {
        let model: ModelKind = self.model.parse()?;

        let mut builder = SynthesisRequestBuilder::default();
        builder
            .text(self.text.as_str())
            .model(model)
            .checkpoint_path(self.checkpoint.as_path())
            .denoise_strength(self.denoise)
            .device(if self.cpu {
                DevicePreference::CpuOnly
            } else {
                DevicePreference::Auto
            });
        if let Some(path) = &self.vocoder_sd {
            builder.vocoder_state_path(path.as_path());
        }
        if let Some(path) = &self.vocoder_config {
            builder.vocoder_config_path(path.as_path());
        }
        if let Some(name) = &self.vowelizer {
            builder.vowelizer(name.as_str());
        }
        builder.build()
    }
}

/// Synthesize, write the artifacts to `out_dir` and optionally play the result.
///
/// Nothing is written unless synthesis succeeds.
pub fn run(
    options: &RunOptions,
    backends: &BackendRegistry,
    resolver: &ConfigResolver,
    phonemizer: &dyn PhonemeConverter,
) -> Result<SynthesisResult, TtsError> {
    let request = options.request()?;
    log::debug!(
        "Available models: {}",
        backends
            .kinds()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let start = Instant::now();
    let result = SynthesisPipeline::new(backends, resolver, phonemizer).run(&request)?;
    log::info!(
        "Synthesized {:.2}s of audio in {:.2?}",
        result.duration_secs(),
        start.elapsed()
    );
    log::info!("Phonemes: {}", result.phonemes_display);

    ArtifactWriter::new(&options.out_dir).write(&result, request.text())?;

    if options.play {
        playback::play_best_effort(&result.wave, result.sample_rate);
    }
    Ok(result)
}
