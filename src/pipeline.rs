//! Text → mel → waveform orchestration.
//!
//! ```text
//! Configuring ──▶ ModelLoading ──▶ Inferring ──▶ PostProcessing ──▶ Done
//!      └──────────────┴─────────────────┴───────────────┴──error──▶ Failed
//! ```
//!
//! Nothing here retries. Any error aborts the request and the pipeline stops
//! in [`PipelineState::Failed`], remembering the stage that failed.

use std::fmt;

use crate::config::ConfigResolver;
use crate::engines::BackendRegistry;
use crate::error::TtsError;
use crate::inference::InferenceMode;
use crate::request::SynthesisRequest;
use crate::text::PhonemeConverter;
use crate::vocoder::Denoiser;
use crate::SynthesisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Validating the request, resolving the device and vocoder paths.
    Configuring,
    /// Loading the acoustic model and vocoder onto the device.
    ModelLoading,
    /// Forward passes: text to mel, mel to waveform.
    Inferring,
    /// Optional denoising.
    PostProcessing,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Configuring => "configuring",
            PipelineState::ModelLoading => "model loading",
            PipelineState::Inferring => "inferring",
            PipelineState::PostProcessing => "post-processing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Runs one synthesis request end to end.
///
/// Holds only borrowed, read-only collaborators; give each request its own
/// pipeline.
pub struct SynthesisPipeline<'a> {
    backends: &'a BackendRegistry,
    resolver: &'a ConfigResolver,
    phonemizer: &'a dyn PhonemeConverter,
    state: PipelineState,
    failed_during: Option<PipelineState>,
}

impl<'a> SynthesisPipeline<'a> {
    pub fn new(
        backends: &'a BackendRegistry,
        resolver: &'a ConfigResolver,
        phonemizer: &'a dyn PhonemeConverter,
    ) -> Self {
        Self {
            backends,
            resolver,
            phonemizer,
            state: PipelineState::Configuring,
            failed_during: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The stage that was running when the pipeline failed.
    pub fn failed_during(&self) -> Option<PipelineState> {
        self.failed_during
    }

    pub fn run(&mut self, request: &SynthesisRequest) -> Result<SynthesisResult, TtsError> {
        self.state = PipelineState::Configuring;
        self.failed_during = None;

        match self.execute(request) {
            Ok(result) => {
                self.enter(PipelineState::Done);
                Ok(result)
            }
            Err(e) => {
                log::debug!("Pipeline failed while {}: {e}", self.state);
                self.failed_during = Some(self.state);
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    fn enter(&mut self, state: PipelineState) {
        log::debug!("Pipeline: {} -> {}", self.state, state);
        self.state = state;
    }

    fn execute(&mut self, request: &SynthesisRequest) -> Result<SynthesisResult, TtsError> {
        // Configuring
        if !self.backends.supports(request.model()) {
            return Err(TtsError::UnsupportedModel(request.model().to_string()));
        }
        let device = request.device().resolve();
        log::debug!("Resolved device: {device}");
        let vocoder_paths = self
            .resolver
            .resolve(request.vocoder_state_path(), request.vocoder_config_path())?;

        self.enter(PipelineState::ModelLoading);
        let mut model = self
            .backends
            .load_acoustic(request.model(), request.checkpoint_path(), device)?;
        model.eval();
        log::info!(
            "Loaded {} from: {}",
            model.kind(),
            request.checkpoint_path().display()
        );

        let mut vocoder = self.backends.load_vocoder(&vocoder_paths, device)?;
        log::info!("Loaded vocoder from: {}", vocoder_paths.state_path.display());

        if model.device() != vocoder.device() {
            return Err(TtsError::DeviceMismatch {
                model: model.device(),
                vocoder: vocoder.device(),
            });
        }

        let (mel, wave) = {
            let _scope = InferenceMode::enter();

            self.enter(PipelineState::Inferring);
            let mel = model.synthesize(request.text(), request.vowelizer())?;
            let mut wave = vocoder.infer(&mel)?;

            self.enter(PipelineState::PostProcessing);
            if request.wants_denoise() {
                let denoiser = Denoiser::new(vocoder.as_mut())?;
                wave = denoiser.denoise(&wave, request.denoise_strength())?;
            }
            (mel, wave)
        };

        let phonemes_raw = self.phonemizer.to_phonemes(request.text(), None)?;
        let phonemes_display = self.phonemizer.simplify(&phonemes_raw);

        Ok(SynthesisResult {
            mel,
            wave,
            sample_rate: vocoder.sample_rate(),
            phonemes_raw,
            phonemes_display,
        })
    }
}
