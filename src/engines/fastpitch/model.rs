use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, Ix3};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;

use crate::audio::MelSpectrogram;
use crate::device::Device;
use crate::engines::AcousticModel;
use crate::error::TtsError;
use crate::inference::InferenceMode;
use crate::onnx::{
    detect_input, extract_first, find_onnx_file, has_input, init_session, SessionParams,
};
use crate::request::ModelKind;
use crate::text::vocab::{encode, vocab_for_checkpoint, Vocab};
use crate::text::PhonemeConverter;

/// Parameters for a FastPitch synthesis call.
#[derive(Debug, Clone)]
pub struct FastPitchParams {
    /// Duration multiplier passed to graphs that expose a `pace` input.
    /// Values above 1.0 speak faster.
    pub pace: f32,
}

impl Default for FastPitchParams {
    fn default() -> Self {
        Self { pace: 1.0 }
    }
}

pub struct FastPitchModel {
    session: Session,
    device: Device,
    vocab: Vocab,
    phonemizer: Arc<dyn PhonemeConverter>,
    params: FastPitchParams,
    /// Detected input name: "text", "inputs", "input_ids" or "tokens"
    tokens_input_name: String,
    has_pace_input: bool,
    eval: bool,
}

impl FastPitchModel {
    pub fn load(
        checkpoint: &Path,
        device: Device,
        phonemizer: Arc<dyn PhonemeConverter>,
        params: FastPitchParams,
        session_params: &SessionParams,
    ) -> Result<Self, TtsError> {
        let onnx_path = find_onnx_file(checkpoint, None, "FastPitch checkpoint")?;
        log::info!("Loading FastPitch model from {}", onnx_path.display());

        let session = init_session(&onnx_path, device, session_params)?;
        let tokens_input_name = detect_input(&session, &["text", "inputs", "input_ids", "tokens"])
            .ok_or_else(|| TtsError::Config("FastPitch graph has no inputs".to_string()))?;
        let has_pace_input = has_input(&session, "pace");

        log::info!(
            "Detected: tokens_input='{}', pace_input={}",
            tokens_input_name,
            has_pace_input
        );

        let vocab = vocab_for_checkpoint(checkpoint)?;

        Ok(Self {
            session,
            device,
            vocab,
            phonemizer,
            params,
            tokens_input_name,
            has_pace_input,
            eval: false,
        })
    }

    fn run(&mut self, tokens: &[i64]) -> Result<MelSpectrogram, TtsError> {
        let tokens_arr = Array2::from_shape_vec((1, tokens.len()), tokens.to_vec())?;

        let output = if self.has_pace_input {
            let pace_arr = Array1::from_elem(1, self.params.pace);
            self.session.run(inputs![
                self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "pace" => TensorRef::from_array_view(pace_arr.view())?,
            ])?
        } else {
            self.session.run(inputs![
                self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
            ])?
        };

        let mel = extract_first(&output)?.into_dimensionality::<Ix3>()?;
        MelSpectrogram::from_batched(mel)
    }
}

impl AcousticModel for FastPitchModel {
    fn kind(&self) -> ModelKind {
        ModelKind::FastPitch
    }

    fn device(&self) -> Device {
        self.device
    }

    fn eval(&mut self) {
        self.eval = true;
    }

    fn is_eval(&self) -> bool {
        self.eval
    }

    fn synthesize(
        &mut self,
        text: &str,
        vowelizer: Option<&str>,
    ) -> Result<MelSpectrogram, TtsError> {
        if !self.eval {
            return Err(TtsError::NotInEvalMode);
        }
        debug_assert!(InferenceMode::is_enabled(), "FastPitch run outside inference scope");

        let phonemes = self.phonemizer.to_phonemes(text, vowelizer)?;
        let tokens = encode(&phonemes, &self.vocab);
        if tokens.is_empty() {
            return Err(TtsError::InvalidRequest(format!(
                "no phoneme tokens produced for text: {text:?}"
            )));
        }
        log::debug!("FastPitch: {} tokens from {phonemes:?}", tokens.len());

        self.run(&tokens)
    }
}
