use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, Array3, Axis, Ix2, Ix3};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;

use crate::audio::{MelSpectrogram, N_MELS};
use crate::device::Device;
use crate::engines::AcousticModel;
use crate::error::TtsError;
use crate::inference::InferenceMode;
use crate::onnx::{extract, init_session, require_file, SessionParams};
use crate::request::ModelKind;
use crate::text::vocab::{encode, vocab_for_checkpoint, Vocab};
use crate::text::PhonemeConverter;

/// Decoder loop and network dimensions.
#[derive(Debug, Clone)]
pub struct Tacotron2Params {
    pub n_mel_channels: usize,
    pub attention_rnn_dim: usize,
    pub decoder_rnn_dim: usize,
    /// Upper bound on decoder steps; reaching it usually means attention failed.
    pub max_decoder_steps: usize,
    /// Stop once `sigmoid(gate)` exceeds this.
    pub gate_threshold: f32,
    /// Whether the exported decoder's mask is `true` at valid encoder
    /// positions (NVIDIA export) rather than at padding.
    pub mask_marks_valid: bool,
}

impl Default for Tacotron2Params {
    fn default() -> Self {
        Self {
            n_mel_channels: N_MELS,
            attention_rnn_dim: 1024,
            decoder_rnn_dim: 1024,
            max_decoder_steps: 1000,
            gate_threshold: 0.5,
            mask_marks_valid: true,
        }
    }
}

/// Recurrent state carried between decoder steps.
#[derive(Debug, Clone)]
struct DecoderState {
    decoder_input: Array2<f32>,
    attention_hidden: Array2<f32>,
    attention_cell: Array2<f32>,
    decoder_hidden: Array2<f32>,
    decoder_cell: Array2<f32>,
    attention_weights: Array2<f32>,
    attention_weights_cum: Array2<f32>,
    attention_context: Array2<f32>,
}

impl DecoderState {
    fn zeros(params: &Tacotron2Params, seq_len: usize, embedding_dim: usize) -> Self {
        Self {
            decoder_input: Array2::zeros((1, params.n_mel_channels)),
            attention_hidden: Array2::zeros((1, params.attention_rnn_dim)),
            attention_cell: Array2::zeros((1, params.attention_rnn_dim)),
            decoder_hidden: Array2::zeros((1, params.decoder_rnn_dim)),
            decoder_cell: Array2::zeros((1, params.decoder_rnn_dim)),
            attention_weights: Array2::zeros((1, seq_len)),
            attention_weights_cum: Array2::zeros((1, seq_len)),
            attention_context: Array2::zeros((1, embedding_dim)),
        }
    }
}

fn gate_fires(gate_logit: f32, threshold: f32) -> bool {
    1.0 / (1.0 + (-gate_logit).exp()) > threshold
}

pub struct Tacotron2Model {
    encoder: Session,
    decoder: Session,
    postnet: Session,
    device: Device,
    vocab: Vocab,
    phonemizer: Arc<dyn PhonemeConverter>,
    params: Tacotron2Params,
    eval: bool,
}

impl Tacotron2Model {
    /// Load the three graphs from a checkpoint directory.
    pub fn load(
        checkpoint: &Path,
        device: Device,
        phonemizer: Arc<dyn PhonemeConverter>,
        params: Tacotron2Params,
        session_params: &SessionParams,
    ) -> Result<Self, TtsError> {
        if !checkpoint.is_dir() {
            return Err(TtsError::MissingFile {
                what: "Tacotron 2 checkpoint directory",
                path: checkpoint.to_path_buf(),
            });
        }
        let encoder_path = require_file(checkpoint, "encoder.onnx", "Tacotron 2 encoder")?;
        let decoder_path = require_file(checkpoint, "decoder_iter.onnx", "Tacotron 2 decoder")?;
        let postnet_path = require_file(checkpoint, "postnet.onnx", "Tacotron 2 postnet")?;

        log::info!("Loading Tacotron 2 model from {}", checkpoint.display());
        let encoder = init_session(&encoder_path, device, session_params)?;
        let decoder = init_session(&decoder_path, device, session_params)?;
        let postnet = init_session(&postnet_path, device, session_params)?;

        let vocab = vocab_for_checkpoint(checkpoint)?;

        Ok(Self {
            encoder,
            decoder,
            postnet,
            device,
            vocab,
            phonemizer,
            params,
            eval: false,
        })
    }

    fn encode(&mut self, tokens: &[i64]) -> Result<(Array3<f32>, Array3<f32>), TtsError> {
        let sequences = Array2::from_shape_vec((1, tokens.len()), tokens.to_vec())?;
        let lengths = Array1::from_elem(1, tokens.len() as i64);

        let output = self.encoder.run(inputs![
            "sequences" => TensorRef::from_array_view(sequences.view())?,
            "sequence_lengths" => TensorRef::from_array_view(lengths.view())?,
        ])?;
        let memory = extract::<Ix3>(&output, "memory")?;
        let processed_memory = extract::<Ix3>(&output, "processed_memory")?;
        Ok((memory, processed_memory))
    }

    /// Run decoder steps until the gate fires. Returns frames `[steps, n_mels]`.
    fn decode(
        &mut self,
        memory: &Array3<f32>,
        processed_memory: &Array3<f32>,
    ) -> Result<Array2<f32>, TtsError> {
        let seq_len = memory.shape()[1];
        let embedding_dim = memory.shape()[2];
        let mask = Array2::from_elem((1, seq_len), self.params.mask_marks_valid);

        let mut state = DecoderState::zeros(&self.params, seq_len, embedding_dim);
        let mut frames: Vec<f32> = Vec::new();
        let mut steps = 0usize;

        loop {
            let output = self.decoder.run(inputs![
                "decoder_input" => TensorRef::from_array_view(state.decoder_input.view())?,
                "attention_hidden" => TensorRef::from_array_view(state.attention_hidden.view())?,
                "attention_cell" => TensorRef::from_array_view(state.attention_cell.view())?,
                "decoder_hidden" => TensorRef::from_array_view(state.decoder_hidden.view())?,
                "decoder_cell" => TensorRef::from_array_view(state.decoder_cell.view())?,
                "attention_weights" => TensorRef::from_array_view(state.attention_weights.view())?,
                "attention_weights_cum" => TensorRef::from_array_view(state.attention_weights_cum.view())?,
                "attention_context" => TensorRef::from_array_view(state.attention_context.view())?,
                "memory" => TensorRef::from_array_view(memory.view())?,
                "processed_memory" => TensorRef::from_array_view(processed_memory.view())?,
                "mask" => TensorRef::from_array_view(mask.view())?,
            ])?;

            let frame = extract::<Ix2>(&output, "decoder_output")?;
            let gate = extract::<Ix2>(&output, "gate_prediction")?;
            let next = DecoderState {
                decoder_input: frame.clone(),
                attention_hidden: extract(&output, "out_attention_hidden")?,
                attention_cell: extract(&output, "out_attention_cell")?,
                decoder_hidden: extract(&output, "out_decoder_hidden")?,
                decoder_cell: extract(&output, "out_decoder_cell")?,
                attention_weights: extract(&output, "out_attention_weights")?,
                attention_weights_cum: extract(&output, "out_attention_weights_cum")?,
                attention_context: extract(&output, "out_attention_context")?,
            };
            drop(output);

            frames.extend(frame.iter().copied());
            steps += 1;
            state = next;

            let gate_logit = gate.iter().next().copied().unwrap_or(f32::NEG_INFINITY);
            if gate_fires(gate_logit, self.params.gate_threshold) {
                break;
            }
            if steps >= self.params.max_decoder_steps {
                log::warn!(
                    "Tacotron 2 reached max decoder steps ({}) without stopping",
                    self.params.max_decoder_steps
                );
                break;
            }
        }

        log::debug!("Tacotron 2 decoded {steps} frames");
        Ok(Array2::from_shape_vec(
            (steps, self.params.n_mel_channels),
            frames,
        )?)
    }

    fn postnet(&mut self, frames: Array2<f32>) -> Result<MelSpectrogram, TtsError> {
        let mel_outputs = frames
            .reversed_axes()
            .insert_axis(Axis(0))
            .as_standard_layout()
            .into_owned();

        let output = self.postnet.run(inputs![
            "mel_outputs" => TensorRef::from_array_view(mel_outputs.view())?,
        ])?;
        let mel = extract::<Ix3>(&output, "mel_outputs_postnet")?;
        MelSpectrogram::from_batched(mel)
    }
}

impl AcousticModel for Tacotron2Model {
    fn kind(&self) -> ModelKind {
        ModelKind::Tacotron2
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
        debug_assert!(InferenceMode::is_enabled(), "Tacotron 2 run outside inference scope");

        let phonemes = self.phonemizer.to_phonemes(text, vowelizer)?;
        let tokens = encode(&phonemes, &self.vocab);
        if tokens.is_empty() {
            return Err(TtsError::InvalidRequest(format!(
                "no phoneme tokens produced for text: {text:?}"
            )));
        }
        log::debug!("Tacotron 2: {} tokens from {phonemes:?}", tokens.len());

        let (memory, processed_memory) = self.encode(&tokens)?;
        let frames = self.decode(&memory, &processed_memory)?;
        self.postnet(frames)
    }
}
