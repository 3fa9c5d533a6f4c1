//! Acoustic model backends and the registry that constructs them.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `onnx` - FastPitch and Tacotron 2 (ONNX format, espeak-ng required)

#[cfg(feature = "onnx")]
pub mod fastpitch;
#[cfg(feature = "onnx")]
pub mod tacotron2;

use std::collections::HashMap;
use std::path::Path;

use crate::audio::MelSpectrogram;
use crate::config::VocoderConfig;
use crate::device::Device;
use crate::error::TtsError;
use crate::request::ModelKind;
use crate::vocoder::Vocoder;

/// Common interface for text-to-mel acoustic models.
///
/// A model is loaded eagerly, switched to evaluation mode with [`eval`] and
/// then used read-only for the duration of one request.
///
/// [`eval`]: AcousticModel::eval
pub trait AcousticModel {
    fn kind(&self) -> ModelKind;

    /// Device the model's weights were placed on.
    fn device(&self) -> Device;

    /// Switch to evaluation mode. Required before [`synthesize`](Self::synthesize).
    fn eval(&mut self);

    fn is_eval(&self) -> bool;

    /// Produce a mel-spectrogram `[freq_bins, frames]` for `text`.
    fn synthesize(
        &mut self,
        text: &str,
        vowelizer: Option<&str>,
    ) -> Result<MelSpectrogram, TtsError>;
}

/// Builds an acoustic model from a checkpoint path.
pub type AcousticLoader =
    Box<dyn Fn(&Path, Device) -> Result<Box<dyn AcousticModel>, TtsError> + Send + Sync>;

/// Builds the vocoder from resolved state and config paths.
pub type VocoderLoader =
    Box<dyn Fn(&VocoderConfig, Device) -> Result<Box<dyn Vocoder>, TtsError> + Send + Sync>;

/// Maps each [`ModelKind`] to its constructor, plus the shared vocoder.
///
/// Looking up a kind that was never registered is the single place an
/// unsupported model is reported.
pub struct BackendRegistry {
    acoustic: HashMap<ModelKind, AcousticLoader>,
    vocoder: VocoderLoader,
}

impl BackendRegistry {
    pub fn new<F>(vocoder: F) -> Self
    where
        F: Fn(&VocoderConfig, Device) -> Result<Box<dyn Vocoder>, TtsError> + Send + Sync + 'static,
    {
        Self {
            acoustic: HashMap::new(),
            vocoder: Box::new(vocoder),
        }
    }

    pub fn register<F>(&mut self, kind: ModelKind, loader: F) -> &mut Self
    where
        F: Fn(&Path, Device) -> Result<Box<dyn AcousticModel>, TtsError> + Send + Sync + 'static,
    {
        self.acoustic.insert(kind, Box::new(loader));
        self
    }

    pub fn supports(&self, kind: ModelKind) -> bool {
        self.acoustic.contains_key(&kind)
    }

    /// Registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<ModelKind> {
        let mut kinds: Vec<ModelKind> = self.acoustic.keys().copied().collect();
        kinds.sort_by_key(|k| k.name());
        kinds
    }

    pub fn load_acoustic(
        &self,
        kind: ModelKind,
        checkpoint: &Path,
        device: Device,
    ) -> Result<Box<dyn AcousticModel>, TtsError> {
        let loader = self
            .acoustic
            .get(&kind)
            .ok_or_else(|| TtsError::UnsupportedModel(kind.to_string()))?;
        loader(checkpoint, device)
    }

    pub fn load_vocoder(
        &self,
        paths: &VocoderConfig,
        device: Device,
    ) -> Result<Box<dyn Vocoder>, TtsError> {
        (self.vocoder)(paths, device)
    }
}

#[cfg(feature = "onnx")]
impl BackendRegistry {
    /// FastPitch, Tacotron 2 and HiFi-GAN, all running on ONNX Runtime.
    pub fn onnx(
        phonemizer: std::sync::Arc<dyn crate::text::PhonemeConverter>,
        session: crate::onnx::SessionParams,
    ) -> Self {
        use fastpitch::{FastPitchModel, FastPitchParams};
        use tacotron2::{Tacotron2Model, Tacotron2Params};

        let vocoder_session = session.clone();
        let mut registry = Self::new(move |paths, device| {
            let vocoder = crate::vocoder::HifiGan::load(paths, device, &vocoder_session)?;
            Ok(Box::new(vocoder) as Box<dyn Vocoder>)
        });

        let fp_phonemizer = phonemizer.clone();
        let fp_session = session.clone();
        registry.register(ModelKind::FastPitch, move |checkpoint, device| {
            let model = FastPitchModel::load(
                checkpoint,
                device,
                fp_phonemizer.clone(),
                FastPitchParams::default(),
                &fp_session,
            )?;
            Ok(Box::new(model) as Box<dyn AcousticModel>)
        });

        registry.register(ModelKind::Tacotron2, move |checkpoint, device| {
            let model = Tacotron2Model::load(
                checkpoint,
                device,
                phonemizer.clone(),
                Tacotron2Params::default(),
                &session,
            )?;
            Ok(Box::new(model) as Box<dyn AcousticModel>)
        });

        registry
    }
}
