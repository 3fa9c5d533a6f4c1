use std::path::PathBuf;

use crate::device::Device;

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("Model type not supported: '{0}'. Expected one of: fastpitch, tacotron2")]
    UnsupportedModel(String),
    #[error("{what} not found at {}", path.display())]
    MissingFile { what: &'static str, path: PathBuf },
    #[error("Vocoder config not found at {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Acoustic model is on {model} but vocoder is on {vocoder}")]
    DeviceMismatch { model: Device, vocoder: Device },
    #[error("Invalid synthesis request: {0}")]
    InvalidRequest(String),
    #[error("Acoustic model must be switched to evaluation mode before inference")]
    NotInEvalMode,
    #[error("Unexpected tensor shape: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
    #[cfg(feature = "onnx")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Vowelizer '{name}' failed: {reason}")]
    VowelizerFailed { name: String, reason: String },
    #[error("Invalid config: {0}")]
    Config(String),
}

/// Failures of the optional playback step. Never fatal to a synthesis run.
#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("audio playback support not compiled in (enable the `playback` feature)")]
    Unsupported,
    #[error("no output device found on the default audio host")]
    NoDevice,
    #[error("audio device error: {0}")]
    Device(String),
}

#[cfg(feature = "playback")]
impl From<cpal::DefaultStreamConfigError> for PlaybackError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        Self::Device(e.to_string())
    }
}

#[cfg(feature = "playback")]
impl From<cpal::BuildStreamError> for PlaybackError {
    fn from(e: cpal::BuildStreamError) -> Self {
        Self::Device(e.to_string())
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PlayStreamError> for PlaybackError {
    fn from(e: cpal::PlayStreamError) -> Self {
        Self::Device(e.to_string())
    }
}
