/*
 * @file listen.rs
 * @brief Speech input adapter built on local Whisper
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

//! Speech input.
//!
//! One call to [`SpeechInput::listen`] captures a single utterance and turns
//! it into text. Recognition failures are reported in-band with two sentinel
//! strings rather than errors, and callers decide what to do with them.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::{contains_speech, load_wav, record_audio};

/// Returned when audio was captured but nothing intelligible was recognized.
pub const NOT_UNDERSTOOD: &str = "Sorry, I couldn't understand.";

/// Returned when the capture device or the recognizer cannot be used.
pub const SERVICE_UNAVAILABLE: &str = "Speech recognition service unavailable.";

/// Captures one utterance and returns recognized text or a sentinel.
///
/// Implementations block until the utterance has been captured and
/// recognized, so async callers should run them on a blocking worker.
pub trait SpeechInput: Send + Sync {
    /// Listens once.
    fn listen(&self) -> String;
}

/// Case-insensitive check for the "couldn't understand" sentinel.
pub fn is_not_understood(text: &str) -> bool {
    text.to_lowercase() == NOT_UNDERSTOOD.to_lowercase()
}

/// Case-insensitive check for the "service unavailable" sentinel.
pub fn is_unavailable(text: &str) -> bool {
    text.to_lowercase() == SERVICE_UNAVAILABLE.to_lowercase()
}

/// Where an utterance comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UtteranceSource {
    /// Default microphone, recorded for a fixed window.
    Microphone(Duration),
    /// Pre-recorded WAV file.
    WavFile(PathBuf),
}

/// Lazily initialized Whisper context shared by every listener.
pub struct WhisperRecognizer {
    model_path: PathBuf,
    ctx: Mutex<Option<WhisperContext>>,
}

impl WhisperRecognizer {
    /// Creates a recognizer; the model is loaded on first use.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ctx: Mutex::new(None),
        }
    }

    /// Transcribes 16 kHz mono samples.
    ///
    /// # Returns
    /// The cleaned transcript, possibly empty.
    ///
    /// # Errors
    /// Returns an error when the model cannot be loaded or inference fails.
    pub fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let mut guard = self.ctx.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(init_whisper(&self.model_path)?);
        }
        let ctx = guard
            .as_ref()
            .context("Whisper context missing after initialization")?;
        let raw = run_whisper_inference(ctx, samples)?;
        Ok(clean_transcript(&raw))
    }
}

/// [`SpeechInput`] that records (or loads) audio and runs Whisper on it.
#[derive(Clone)]
pub struct WhisperListener {
    recognizer: Arc<WhisperRecognizer>,
    source: UtteranceSource,
}

impl WhisperListener {
    /// Creates a listener for `source`.
    pub fn new(recognizer: Arc<WhisperRecognizer>, source: UtteranceSource) -> Self {
        Self { recognizer, source }
    }

    /// Listener sharing this one's recognizer but reading from a WAV file.
    pub fn for_file(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(self.recognizer.clone(), UtteranceSource::WavFile(path.into()))
    }

    fn capture(&self) -> Result<Vec<f32>> {
        match &self.source {
            UtteranceSource::Microphone(duration) => record_audio(*duration),
            UtteranceSource::WavFile(path) => load_wav(path),
        }
    }
}

impl SpeechInput for WhisperListener {
    fn listen(&self) -> String {
        let samples = match self.capture() {
            Ok(samples) => samples,
            Err(err) => {
                tracing::warn!("Audio capture failed: {:#}", err);
                return SERVICE_UNAVAILABLE.to_string();
            }
        };
        if !contains_speech(&samples) {
            tracing::debug!("Captured audio is silent");
            return NOT_UNDERSTOOD.to_string();
        }
        match self.recognizer.transcribe(&samples) {
            Ok(text) if text.is_empty() => NOT_UNDERSTOOD.to_string(),
            Ok(text) => {
                tracing::info!(chars = text.len(), "speech recognized");
                text
            }
            Err(err) => {
                tracing::warn!("Speech recognition failed: {:#}", err);
                SERVICE_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Strips Whisper's non-speech markers such as `[BLANK_AUDIO]` or `(music)`.
pub fn clean_transcript(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut depth = 0_usize;
    for ch in raw.chars() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => cleaned.push(ch),
            _ => {}
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn init_whisper(model_path: &Path) -> Result<WhisperContext> {
    if !model_path.exists() {
        anyhow::bail!(
            "Whisper model not found at {} (download ggml-base.en.bin from whisper.cpp)",
            model_path.display()
        );
    }
    let path = model_path
        .to_str()
        .context("Whisper model path is not valid UTF-8")?;
    let mut params = WhisperContextParameters::default();
    params.use_gpu(false);
    tracing::info!("Loading Whisper model from {}", model_path.display());
    WhisperContext::new_with_params(path, params).context("Failed to initialize Whisper")
}

fn run_whisper_inference(ctx: &WhisperContext, samples: &[f32]) -> Result<String> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some("en"));
    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    let mut state = ctx.create_state().context("Failed to create Whisper state")?;
    state
        .full(params, samples)
        .context("Whisper transcription failed")?;
    let segments = state.full_n_segments().context("Failed to count segments")?;
    let mut text = String::new();
    for i in 0..segments {
        if let Ok(segment) = state.full_get_segment_text(i) {
            text.push_str(&segment);
            text.push(' ');
        }
    }
    Ok(text.trim().to_string())
}
