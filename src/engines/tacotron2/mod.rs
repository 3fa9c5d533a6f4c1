//! Tacotron 2 acoustic model.
//!
//! Tacotron 2 is autoregressive: an attention decoder emits one mel frame per
//! step, feeding each frame back as the next input, until the stop gate fires.
//! The decoder loop runs here; the network itself is three exported graphs.
//!
//! # Determinism
//!
//! Output is reproducible for fixed weights and input as long as the exported
//! `decoder_iter.onnx` has no random ops. Exports that keep the prenet's
//! dropout active at inference produce different mels run to run.
//!
//! # Checkpoint Layout
//!
//! ```text
//! pretrained/tacotron2_ar_adv/
//! ├── encoder.onnx        # sequences [1, T], sequence_lengths [1] -> memory, processed_memory
//! ├── decoder_iter.onnx   # one decoder step
//! ├── postnet.onnx        # mel_outputs [1, 80, F] -> mel_outputs_postnet
//! └── config.json         # optional {"vocab": {...}} phoneme table
//! ```

pub mod model;

pub use model::{Tacotron2Model, Tacotron2Params};
