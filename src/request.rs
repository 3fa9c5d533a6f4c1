use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_builder::Builder;

use crate::device::DevicePreference;
use crate::error::TtsError;

/// Registered acoustic model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// FastPitch: non-autoregressive, predicts all frames in parallel.
    FastPitch,
    /// Tacotron 2: autoregressive encoder-decoder with attention.
    Tacotron2,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::FastPitch, ModelKind::Tacotron2];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::FastPitch => "fastpitch",
            ModelKind::Tacotron2 => "tacotron2",
        }
    }

    pub fn is_autoregressive(self) -> bool {
        matches!(self, ModelKind::Tacotron2)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TtsError::UnsupportedModel(s.to_string()))
    }
}

impl From<derive_builder::UninitializedFieldError> for TtsError {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        TtsError::InvalidRequest(e.to_string())
    }
}

/// One text-to-speech request. Immutable once built.
///
/// ```rust
/// use arabic_tts::{ModelKind, SynthesisRequestBuilder};
///
/// let request = SynthesisRequestBuilder::default()
///     .text("اشتركوا في القناة")
///     .model(ModelKind::FastPitch)
///     .checkpoint_path("pretrained/fastpitch_ar_adv.onnx")
///     .denoise_strength(0.01)
///     .build()?;
/// assert!(request.vocoder_state_path().is_none());
/// # Ok::<(), arabic_tts::TtsError>(())
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "TtsError"))]
pub struct SynthesisRequest {
    #[builder(setter(into))]
    text: String,
    model: ModelKind,
    #[builder(setter(into))]
    checkpoint_path: PathBuf,
    #[builder(setter(into, strip_option), default)]
    vocoder_state_path: Option<PathBuf>,
    #[builder(setter(into, strip_option), default)]
    vocoder_config_path: Option<PathBuf>,
    /// Denoiser strength; `0.0` disables denoising entirely.
    #[builder(default)]
    denoise_strength: f32,
    #[builder(setter(into, strip_option), default)]
    vowelizer: Option<String>,
    #[builder(default)]
    device: DevicePreference,
}

impl SynthesisRequestBuilder {
    fn validate(&self) -> Result<(), TtsError> {
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err(TtsError::InvalidRequest("text must not be empty".into()));
            }
        }
        if let Some(strength) = self.denoise_strength {
            if !strength.is_finite() || strength < 0.0 {
                return Err(TtsError::InvalidRequest(format!(
                    "denoise strength must be a finite value >= 0, got {strength}"
                )));
            }
        }
        Ok(())
    }
}

impl SynthesisRequest {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn vocoder_state_path(&self) -> Option<&Path> {
        self.vocoder_state_path.as_deref()
    }

    pub fn vocoder_config_path(&self) -> Option<&Path> {
        self.vocoder_config_path.as_deref()
    }

    pub fn denoise_strength(&self) -> f32 {
        self.denoise_strength
    }

    /// Denoising runs only for a strictly positive strength.
    pub fn wants_denoise(&self) -> bool {
        self.denoise_strength > 0.0
    }

    pub fn vowelizer(&self) -> Option<&str> {
        self.vowelizer.as_deref()
    }

    pub fn device(&self) -> DevicePreference {
        self.device
    }
}
