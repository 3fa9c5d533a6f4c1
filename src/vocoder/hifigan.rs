use ndarray::{Array3, Axis, Ix2, Ix3};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;

use super::{check_mel_bins, HifiGanConfig, Vocoder};
use crate::audio::{MelSpectrogram, Waveform};
use crate::config::VocoderConfig;
use crate::device::Device;
use crate::error::TtsError;
use crate::inference::InferenceMode;
use crate::onnx::{detect_input, extract_first, init_session, SessionParams};

/// HiFi-GAN vocoder exported to ONNX.
///
/// Expects a graph taking mel `[1, num_mels, frames]` and returning audio
/// `[1, 1, samples]` (or `[1, samples]`).
pub struct HifiGan {
    session: Session,
    config: HifiGanConfig,
    device: Device,
    mel_input_name: String,
}

impl HifiGan {
    pub fn load(
        paths: &VocoderConfig,
        device: Device,
        params: &SessionParams,
    ) -> Result<Self, TtsError> {
        if !paths.state_path.is_file() {
            return Err(TtsError::MissingFile {
                what: "Vocoder state",
                path: paths.state_path.clone(),
            });
        }
        let config = HifiGanConfig::load(&paths.config_path)?;

        log::info!("Loading HiFi-GAN vocoder from {}", paths.state_path.display());
        let session = init_session(&paths.state_path, device, params)?;
        let mel_input_name = detect_input(&session, &["mel", "x", "input"])
            .ok_or_else(|| TtsError::Config("vocoder graph has no inputs".to_string()))?;

        log::debug!(
            "HiFi-GAN: input='{}', num_mels={}, sampling_rate={}",
            mel_input_name,
            config.num_mels,
            config.sampling_rate
        );

        Ok(Self {
            session,
            config,
            device,
            mel_input_name,
        })
    }

    pub fn config(&self) -> &HifiGanConfig {
        &self.config
    }
}

impl Vocoder for HifiGan {
    fn device(&self) -> Device {
        self.device
    }

    fn sample_rate(&self) -> u32 {
        self.config.sampling_rate
    }

    fn num_mels(&self) -> usize {
        self.config.num_mels
    }

    fn infer(&mut self, mel: &MelSpectrogram) -> Result<Waveform, TtsError> {
        debug_assert!(InferenceMode::is_enabled(), "vocoder run outside inference scope");
        check_mel_bins(mel, self.config.num_mels)?;

        let batched = mel.batched();
        let output = self.session.run(inputs![
            self.mel_input_name.as_str() => TensorRef::from_array_view(batched.view())?,
        ])?;
        let audio = extract_first(&output)?;

        let audio: Array3<f32> = match audio.ndim() {
            3 => audio.into_dimensionality::<Ix3>()?,
            2 => audio.into_dimensionality::<Ix2>()?.insert_axis(Axis(1)),
            _ => {
                return Err(TtsError::ShapeMismatch {
                    expected: "[1, channels, samples]".to_string(),
                    found: format!("{:?}", audio.shape()),
                })
            }
        };

        Waveform::new(audio)
    }
}
