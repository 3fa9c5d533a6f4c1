use ndarray::{s, Array2, Array3, ArrayView1, Axis};

use super::stft::Stft;
use super::Vocoder;
use crate::audio::{MelSpectrogram, Waveform};
use crate::error::TtsError;

const FILTER_LENGTH: usize = 1024;
const HOP_LENGTH: usize = 256;
const WIN_LENGTH: usize = 1024;

/// Frames of silent mel used to measure the vocoder's bias.
pub const BIAS_FRAMES: usize = 88;

/// Removes the vocoder's constant artifact noise by spectral subtraction.
///
/// The bias spectrum is what the vocoder produces for an all-zero mel; it is
/// subtracted, scaled by the strength, from every frame of the input.
pub struct Denoiser {
    stft: Stft,
    bias: Vec<f32>,
}

impl Denoiser {
    /// Measure the bias of `vocoder`. Runs one forward pass.
    pub fn new(vocoder: &mut dyn Vocoder) -> Result<Self, TtsError> {
        let silence = MelSpectrogram::new(Array2::zeros((vocoder.num_mels(), BIAS_FRAMES)));
        let bias_audio = vocoder.infer(&silence)?;
        let samples = bias_audio.channel(0).to_vec();
        Ok(Self::from_bias_audio(&samples))
    }

    /// Build from audio the vocoder produced for silence.
    pub fn from_bias_audio(samples: &[f32]) -> Self {
        let stft = Stft::new(FILTER_LENGTH, HOP_LENGTH, WIN_LENGTH);
        let spectrum = stft.transform(samples);
        let bias = if spectrum.magnitude.ncols() == 0 {
            vec![0.0; stft.n_bins()]
        } else {
            spectrum.magnitude.column(0).to_vec()
        };
        Self { stft, bias }
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    /// Subtract `strength` times the bias spectrum from each channel.
    ///
    /// The result has the same shape as `wave`. A strength of `0.0` returns
    /// the input unchanged.
    pub fn denoise(&self, wave: &Waveform, strength: f32) -> Result<Waveform, TtsError> {
        if strength == 0.0 {
            return Ok(wave.clone());
        }

        let channels = wave.channels();
        let len = wave.num_samples();
        let mut out = Array3::<f32>::zeros((1, channels, len));

        for c in 0..channels {
            let samples = wave.channel(c).to_vec();
            let spectrum = self.stft.transform(&samples);
            let mut magnitude = spectrum.magnitude;
            for (mut row, &b) in magnitude.axis_iter_mut(Axis(0)).zip(&self.bias) {
                row.mapv_inplace(|m| (m - b * strength).max(0.0));
            }
            let denoised = self.stft.inverse(&magnitude, &spectrum.phase, len);
            out.slice_mut(s![0, c, ..])
                .assign(&ArrayView1::from(&denoised[..]));
        }

        Waveform::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use std::f32::consts::PI;

    /// Emits a faint 1 kHz hum on top of whatever the mel asks for.
    struct HummingVocoder {
        calls: usize,
    }

    fn hum(i: usize) -> f32 {
        0.02 * (2.0 * PI * 1_000.0 * i as f32 / 22_050.0).cos()
    }

    impl Vocoder for HummingVocoder {
        fn device(&self) -> Device {
            Device::Cpu
        }

        fn sample_rate(&self) -> u32 {
            22_050
        }

        fn num_mels(&self) -> usize {
            80
        }

        fn infer(&mut self, mel: &MelSpectrogram) -> Result<Waveform, TtsError> {
            self.calls += 1;
            let samples = (0..mel.frames() * 256)
                .map(|i| {
                    let level = mel.view()[[0, i / 256]];
                    level * (2.0 * PI * 300.0 * i as f32 / 22_050.0).sin() + hum(i)
                })
                .collect();
            Ok(Waveform::mono(samples))
        }
    }

    #[test]
    fn measures_bias_with_one_silent_pass() {
        let mut vocoder = HummingVocoder { calls: 0 };
        let denoiser = Denoiser::new(&mut vocoder).unwrap();
        assert_eq!(vocoder.calls, 1);
        assert_eq!(denoiser.bias().len(), FILTER_LENGTH / 2 + 1);

        let hum_bin = (1_000.0 * FILTER_LENGTH as f32 / 22_050.0).round() as usize;
        let peak = denoiser
            .bias()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak.abs_diff(hum_bin) <= 1, "peak at {peak}, hum at {hum_bin}");
    }

    #[test]
    fn denoising_reduces_the_hum_and_keeps_shape() {
        let mut vocoder = HummingVocoder { calls: 0 };
        let denoiser = Denoiser::new(&mut vocoder).unwrap();

        let noisy = Waveform::mono((0..8_192).map(hum).collect());
        let cleaned = denoiser.denoise(&noisy, 1.0).unwrap();

        assert_eq!(cleaned.shape(), noisy.shape());
        let energy = |w: &Waveform| w.channel(0).iter().map(|s| s * s).sum::<f32>();
        assert!(energy(&cleaned) < 0.25 * energy(&noisy));
    }

    #[test]
    fn positive_strength_changes_the_waveform() {
        let mut vocoder = HummingVocoder { calls: 0 };
        let denoiser = Denoiser::new(&mut vocoder).unwrap();
        let mel = MelSpectrogram::new(Array2::from_elem((80, 40), 0.5));
        let wave = vocoder.infer(&mel).unwrap();

        let cleaned = denoiser.denoise(&wave, 0.01).unwrap();
        assert_eq!(cleaned.shape(), wave.shape());
        assert_ne!(cleaned, wave);
    }

    #[test]
    fn zero_strength_is_identity() {
        let denoiser = Denoiser::from_bias_audio(&(0..4_096).map(hum).collect::<Vec<_>>());
        let wave = Waveform::mono((0..3_000).map(|i| (i as f32 * 0.01).sin()).collect());
        assert_eq!(denoiser.denoise(&wave, 0.0).unwrap(), wave);
    }

    #[test]
    fn multichannel_input_is_processed_per_channel() {
        let denoiser = Denoiser::from_bias_audio(&(0..4_096).map(hum).collect::<Vec<_>>());
        let data =
            Array3::from_shape_fn((1, 2, 2_048), |(_, c, i)| if c == 0 { hum(i) } else { 0.0 });
        let wave = Waveform::new(data).unwrap();

        let cleaned = denoiser.denoise(&wave, 1.0).unwrap();
        assert_eq!(cleaned.shape(), &[1, 2, 2_048]);
        assert!(cleaned.channel(1).iter().all(|s| s.abs() < 1e-6));
    }
}
