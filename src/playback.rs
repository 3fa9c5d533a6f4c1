//! Best-effort playback of a synthesized waveform.
//!
//! Playback is a convenience for interactive runs: [`play_best_effort`]
//! logs and swallows every failure so a missing sound card never fails a
//! synthesis.

use crate::audio::Waveform;
use crate::error::PlaybackError;

/// Play the first channel of `wave` on the default output device, blocking
/// until it has finished.
#[cfg(feature = "playback")]
pub fn play(wave: &Waveform, sample_rate: u32) -> Result<(), PlaybackError> {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::SampleFormat;

    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
    let supported = device.default_output_config()?;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let samples = resample(&wave.channel(0).to_vec(), sample_rate, config.sample_rate.0);
    let source = Source {
        finished: Arc::new(AtomicBool::new(samples.is_empty())),
        samples: Arc::new(samples),
        cursor: Arc::new(AtomicUsize::new(0)),
    };

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, &source)?,
        SampleFormat::F64 => build_stream::<f64>(&device, &config, &source)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, &source)?,
        SampleFormat::I32 => build_stream::<i32>(&device, &config, &source)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, &source)?,
        SampleFormat::U8 => build_stream::<u8>(&device, &config, &source)?,
        other => {
            return Err(PlaybackError::Device(format!(
                "unsupported output sample format {other:?}"
            )))
        }
    };
    stream.play()?;

    let deadline = Instant::now()
        + Duration::from_secs_f64(wave.duration_secs(sample_rate))
        + Duration::from_secs(2);
    while !source.finished.load(Ordering::Acquire) {
        if Instant::now() > deadline {
            log::warn!("Playback did not finish in time, stopping");
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    Ok(())
}

/// Mono samples shared with the audio callback.
#[cfg(feature = "playback")]
struct Source {
    samples: std::sync::Arc<Vec<f32>>,
    cursor: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    finished: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

/// Output stream converting the mono `f32` source to the device's sample type.
#[cfg(feature = "playback")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source: &Source,
) -> Result<cpal::Stream, PlaybackError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use cpal::traits::DeviceTrait;

    let channels = config.channels as usize;
    let samples = Arc::clone(&source.samples);
    let cursor = Arc::clone(&source.cursor);
    let finished = Arc::clone(&source.finished);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if fill_frames(data, channels, &samples, &cursor) {
                finished.store(true, Ordering::Release);
            }
        },
        |err: cpal::StreamError| {
            log::error!("cpal stream error: {err}");
        },
        None,
    )?;
    Ok(stream)
}

/// Copy the next mono samples into every channel of `data`, converted to `T`.
/// Returns true once the source is exhausted.
#[cfg(feature = "playback")]
fn fill_frames<T>(
    data: &mut [T],
    channels: usize,
    samples: &[f32],
    cursor: &std::sync::atomic::AtomicUsize,
) -> bool
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    let mut exhausted = false;
    for frame in data.chunks_mut(channels.max(1)) {
        let pos = cursor.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let value = match samples.get(pos) {
            Some(&v) => v,
            None => {
                exhausted = true;
                0.0
            }
        };
        frame.fill(T::from_sample(value));
    }
    exhausted
}

#[cfg(not(feature = "playback"))]
pub fn play(_wave: &Waveform, _sample_rate: u32) -> Result<(), PlaybackError> {
    Err(PlaybackError::Unsupported)
}

/// Play `wave`, logging instead of returning any failure.
pub fn play_best_effort(wave: &Waveform, sample_rate: u32) {
    match play(wave, sample_rate) {
        Ok(()) => log::debug!("Playback finished"),
        Err(e) => log::warn!("Skipping playback: {e}"),
    }
}

/// Linear-interpolation resampling to the output device rate.
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let ratio = from as f64 / to as f64;
    let len = ((samples.len() as f64) / ratio).round() as usize;
    (0..len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}
