//! FastPitch acoustic model.
//!
//! FastPitch is non-autoregressive: durations, pitch and energy are predicted
//! per phoneme and all mel frames are produced in a single forward pass. For
//! fixed weights, text and vowelizer the output is bit-reproducible.
//!
//! # Checkpoint Layout
//!
//! ```text
//! pretrained/
//! ├── fastpitch_ar_adv.onnx   # exported generator, tokens [1, T] -> mel [1, 80, F]
//! └── fastpitch_ar_adv.json   # optional {"vocab": {...}} phoneme table
//! ```
//!
//! A directory may be given instead of a file; the first `.onnx` file in it is
//! used, with its vocabulary read from `config.json`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use arabic_tts::engines::{fastpitch::{FastPitchModel, FastPitchParams}, AcousticModel};
//! use arabic_tts::{onnx::SessionParams, Device, EspeakPhonemizer, InferenceMode};
//!
//! let mut model = FastPitchModel::load(
//!     Path::new("pretrained/fastpitch_ar_adv.onnx"),
//!     Device::Cpu,
//!     Arc::new(EspeakPhonemizer::default()),
//!     FastPitchParams::default(),
//!     &SessionParams::default(),
//! )?;
//! model.eval();
//!
//! let _scope = InferenceMode::enter();
//! let mel = model.synthesize("اشتركوا في القناة", None)?;
//! println!("{} mel frames", mel.frames());
//! # Ok::<(), arabic_tts::TtsError>(())
//! ```

pub mod model;

pub use model::{FastPitchModel, FastPitchParams};
