//! Short-time Fourier transform with exact overlap-add inversion.

use std::f32::consts::PI;
use std::sync::Arc;

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Magnitude and phase, each `[n_fft / 2 + 1, frames]`.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub magnitude: Array2<f32>,
    pub phase: Array2<f32>,
}

/// Centered STFT with a periodic Hann window and reflect padding.
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// `win_length` must not exceed `n_fft`; shorter windows are zero-padded
    /// to the centre of the frame.
    pub fn new(n_fft: usize, hop_length: usize, win_length: usize) -> Self {
        let win_length = win_length.min(n_fft);
        let offset = (n_fft - win_length) / 2;
        let mut window = vec![0.0f32; n_fft];
        for i in 0..win_length {
            window[offset + i] = 0.5 - 0.5 * (2.0 * PI * i as f32 / win_length as f32).cos();
        }

        let mut planner = FftPlanner::new();
        Self {
            n_fft,
            hop_length,
            window,
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn transform(&self, samples: &[f32]) -> Spectrum {
        let n_bins = self.n_bins();
        if samples.is_empty() {
            return Spectrum {
                magnitude: Array2::zeros((n_bins, 0)),
                phase: Array2::zeros((n_bins, 0)),
            };
        }

        let pad = self.n_fft / 2;
        let padded: Vec<f32> = (0..samples.len() + 2 * pad)
            .map(|i| samples[reflect(i as isize - pad as isize, samples.len())])
            .collect();
        let n_frames = 1 + samples.len() / self.hop_length;

        let mut magnitude = Array2::zeros((n_bins, n_frames));
        let mut phase = Array2::zeros((n_bins, n_frames));
        let mut buf = vec![Complex::new(0.0f32, 0.0); self.n_fft];

        for t in 0..n_frames {
            let start = t * self.hop_length;
            for (k, slot) in buf.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + k] * self.window[k], 0.0);
            }
            self.forward.process(&mut buf);
            for f in 0..n_bins {
                magnitude[[f, t]] = buf[f].norm();
                phase[[f, t]] = buf[f].arg();
            }
        }

        Spectrum { magnitude, phase }
    }

    /// Resynthesise `len` samples from a magnitude/phase pair.
    pub fn inverse(&self, magnitude: &Array2<f32>, phase: &Array2<f32>, len: usize) -> Vec<f32> {
        let n_bins = self.n_bins();
        let n_frames = magnitude.ncols();
        let pad = self.n_fft / 2;
        let total = (n_frames.saturating_sub(1)) * self.hop_length + self.n_fft;

        let mut out = vec![0.0f32; total];
        let mut window_sum = vec![0.0f32; total];
        let mut buf = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let scale = 1.0 / self.n_fft as f32;

        for t in 0..n_frames {
            for f in 0..n_bins {
                buf[f] = Complex::from_polar(magnitude[[f, t]], phase[[f, t]]);
            }
            for f in 1..self.n_fft - n_bins + 1 {
                buf[self.n_fft - f] = buf[f].conj();
            }
            self.inverse.process(&mut buf);

            let start = t * self.hop_length;
            for k in 0..self.n_fft {
                let w = self.window[k];
                out[start + k] += buf[k].re * scale * w;
                window_sum[start + k] += w * w;
            }
        }

        for (sample, &wsum) in out.iter_mut().zip(&window_sum) {
            if wsum > f32::MIN_POSITIVE {
                *sample /= wsum;
            }
        }

        (0..len)
            .map(|i| out.get(pad + i).copied().unwrap_or(0.0))
            .collect()
    }
}

/// Mirror an out-of-range index back into `0..len` (numpy "reflect" mode).
fn reflect(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = i.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chirp(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / 22_050.0;
                0.4 * (2.0 * PI * (220.0 + 800.0 * t) * t).sin()
            })
            .collect()
    }

    #[test]
    fn reflect_mirrors_without_repeating_edges() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-2, 5), 2);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-7, 3), 1);
    }

    #[test]
    fn frame_count_matches_centered_layout() {
        let stft = Stft::new(1024, 256, 1024);
        let spec = stft.transform(&chirp(22_050));
        assert_eq!(spec.magnitude.dim(), (513, 1 + 22_050 / 256));
        assert_eq!(spec.phase.dim(), spec.magnitude.dim());
    }

    #[test]
    fn inverse_reconstructs_the_signal() {
        let stft = Stft::new(1024, 256, 1024);
        let signal = chirp(5_000);
        let spec = stft.transform(&signal);
        let rebuilt = stft.inverse(&spec.magnitude, &spec.phase, signal.len());

        assert_eq!(rebuilt.len(), signal.len());
        let max_err = signal
            .iter()
            .zip(&rebuilt)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-3, "max reconstruction error {max_err}");
    }

    #[test]
    fn handles_signals_shorter_than_a_frame() {
        let stft = Stft::new(1024, 256, 1024);
        let signal = chirp(100);
        let spec = stft.transform(&signal);
        let rebuilt = stft.inverse(&spec.magnitude, &spec.phase, signal.len());
        assert_eq!(rebuilt.len(), 100);
        assert!(stft.transform(&[]).magnitude.is_empty());
    }
}
