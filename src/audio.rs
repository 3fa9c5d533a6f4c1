use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};

use crate::error::TtsError;

/// Number of mel bins produced by the shipped acoustic models.
pub const N_MELS: usize = 80;

/// Output sample rate of the shipped HiFi-GAN vocoder.
pub const SAMPLE_RATE: u32 = 22_050;

/// Mel-spectrogram of shape `[freq_bins, frames]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram(Array2<f32>);

impl MelSpectrogram {
    pub fn new(data: Array2<f32>) -> Self {
        Self(data)
    }

    /// Build from a model output of shape `[1, freq_bins, frames]`.
    pub fn from_batched(data: Array3<f32>) -> Result<Self, TtsError> {
        if data.shape()[0] != 1 {
            return Err(TtsError::ShapeMismatch {
                expected: "[1, freq_bins, frames]".to_string(),
                found: format!("{:?}", data.shape()),
            });
        }
        Ok(Self(data.index_axis_move(Axis(0), 0)))
    }

    pub fn freq_bins(&self) -> usize {
        self.0.nrows()
    }

    pub fn frames(&self) -> usize {
        self.0.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }

    /// Batch-of-one view `[1, freq_bins, frames]`, the vocoder's input layout.
    pub fn batched(&self) -> Array3<f32> {
        self.0.clone().insert_axis(Axis(0))
    }
}

/// Audio of shape `[batch = 1, channels, samples]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform(Array3<f32>);

impl Waveform {
    pub fn new(data: Array3<f32>) -> Result<Self, TtsError> {
        if data.shape()[0] != 1 || data.shape()[1] == 0 {
            return Err(TtsError::ShapeMismatch {
                expected: "[1, channels, samples]".to_string(),
                found: format!("{:?}", data.shape()),
            });
        }
        Ok(Self(data))
    }

    pub fn mono(samples: Vec<f32>) -> Self {
        Self(
            Array1::from_vec(samples)
                .insert_axis(Axis(0))
                .insert_axis(Axis(0)),
        )
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn channels(&self) -> usize {
        self.0.shape()[1]
    }

    pub fn num_samples(&self) -> usize {
        self.0.shape()[2]
    }

    pub fn channel(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.0.index_axis(Axis(0), 0).index_axis_move(Axis(0), idx)
    }

    /// Samples interleaved across channels, the layout WAV writers expect.
    pub fn interleaved(&self) -> Vec<f32> {
        let frame = self.0.index_axis(Axis(0), 0);
        frame.t().iter().copied().collect()
    }

    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.num_samples() as f64 / sample_rate as f64
    }
}
