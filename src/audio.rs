/*
 * @file audio.rs
 * @brief Audio capture and WAV helpers for MasterBot
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Audio recording and WAV file operations.
//!
//! Microphone input is captured with CPAL; WAV files are read and written with
//! hound. Everything handed to the recognizer is 16 kHz mono `f32` in
//! `[-1.0, 1.0]`.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig, StreamError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Sample rate expected by the recognizer, in Hertz.
pub const SAMPLE_RATE: u32 = 16000;

/// Number of audio channels (mono).
const CHANNELS: u16 = 1;

/// Bits per sample for WAV encoding.
const BITS_PER_SAMPLE: u16 = 16;

/// Minimum RMS amplitude considered speech, on the normalized scale.
///
/// Roughly 150 on the 16-bit integer scale; normal speaking levels sit well
/// above this on most microphones.
const SILENCE_RMS_THRESHOLD: f32 = 150.0 / 32768.0;

/// Records audio from the default input device for a fixed duration.
///
/// # Parameters
/// * `duration` - Capture window.
///
/// # Returns
/// Normalized mono samples at [`SAMPLE_RATE`].
///
/// # Errors
/// Returns an error if no input device is available or the stream cannot be
/// created or started.
pub fn record_audio(duration: Duration) -> Result<Vec<f32>> {
    let device = default_input_device()?;
    let config = input_config();
    let samples = shared_samples();
    let stream = build_input_stream(&device, &config, samples.clone())?;
    stream.play().context("Failed to start input stream")?;
    std::thread::sleep(duration);
    drop(stream);
    let captured = samples
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    tracing::debug!(samples = captured.len(), "microphone capture finished");
    Ok(captured)
}

/// Saves normalized samples to a 16-bit mono WAV file at [`SAMPLE_RATE`].
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Loads a WAV file and converts it to recognizer-ready samples.
///
/// # Details
/// Integer and float WAVs are both accepted. Multi-channel audio is averaged
/// down to mono before resampling to [`SAMPLE_RATE`].
///
/// # Errors
/// Returns an error if the file cannot be opened, is not a valid WAV, or a
/// sample cannot be decoded.
pub fn load_wav(path: &Path) -> Result<Vec<f32>> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();
    let samples = read_normalized(reader, spec)?;
    let mono = downmix(samples, spec.channels);
    Ok(resample(&mono, spec.sample_rate, SAMPLE_RATE))
}

/// Detects whether samples carry enough energy to contain speech.
///
/// # Returns
/// `true` when the RMS energy reaches the silence threshold.
pub fn contains_speech(samples: &[f32]) -> bool {
    if samples.is_empty() {
        return false;
    }
    let energy = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    energy.sqrt() >= SILENCE_RMS_THRESHOLD
}

fn read_normalized(
    reader: WavReader<std::io::BufReader<std::fs::File>>,
    spec: WavSpec,
) -> Result<Vec<f32>> {
    match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read WAV samples"),
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read WAV samples")
        }
    }
}

/// Averages interleaved channels into a single channel.
fn downmix(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resamples using linear interpolation.
///
/// Not as precise as sinc interpolation, but plenty for speech recognition.
fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 {
        return input.to_vec();
    }
    let ratio = from_rate as f32 / to_rate as f32;
    let output_len = (input.len() as f32 / ratio) as usize;
    (0..output_len)
        .map(|i| sample_at_position(input, i as f32 * ratio))
        .collect()
}

fn sample_at_position(input: &[f32], pos: f32) -> f32 {
    let idx = pos as usize;
    if idx + 1 < input.len() {
        let frac = pos - idx as f32;
        input[idx] * (1.0 - frac) + input[idx + 1] * frac
    } else if idx < input.len() {
        input[idx]
    } else {
        0.0
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn default_input_device() -> Result<Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| anyhow::anyhow!("No input device"))
}

fn input_config() -> StreamConfig {
    StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    }
}

fn shared_samples() -> Arc<Mutex<Vec<f32>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    samples: Arc<Mutex<Vec<f32>>>,
) -> Result<Stream> {
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &_| push_samples(&samples, data),
            log_stream_error,
            None,
        )
        .map_err(|err| anyhow::anyhow!(err))
}

/// Appends the latest CPAL frames to the shared buffer.
fn push_samples(buffer: &Arc<Mutex<Vec<f32>>>, data: &[f32]) {
    let mut guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.extend(data.iter().map(|s| s.clamp(-1.0, 1.0)));
}

fn log_stream_error(error: StreamError) {
    tracing::warn!("Audio stream error: {}", error);
}
