//! Spectrogram rendering.

use image::{ImageBuffer, Rgb, RgbImage};

use crate::audio::MelSpectrogram;

/// Pixels per mel frame (horizontal) and per mel bin (vertical).
const FRAME_PX: u32 = 2;
const BIN_PX: u32 = 3;

// Viridis anchor colours, low to high.
const PALETTE: [[f32; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

fn colour(t: f32) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (PALETTE.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(PALETTE.len() - 2);
    let frac = scaled - i as f32;
    let (a, b) = (PALETTE[i], PALETTE[i + 1]);
    Rgb([
        (a[0] + (b[0] - a[0]) * frac).round() as u8,
        (a[1] + (b[1] - a[1]) * frac).round() as u8,
        (a[2] + (b[2] - a[2]) * frac).round() as u8,
    ])
}

/// Render `mel` with low frequencies at the bottom, min-max normalised.
pub fn spectrogram_image(mel: &MelSpectrogram) -> RgbImage {
    let bins = mel.freq_bins().max(1) as u32;
    let frames = mel.frames().max(1) as u32;
    let view = mel.view();

    let (min, max) = view
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = if max > min { max - min } else { 1.0 };

    ImageBuffer::from_fn(frames * FRAME_PX, bins * BIN_PX, |x, y| {
        let frame = (x / FRAME_PX) as usize;
        let bin = (bins - 1 - y / BIN_PX) as usize;
        match view.get((bin, frame)) {
            Some(&v) => colour((v - min) / range),
            None => colour(0.0),
        }
    })
}
