/*
 * @file config.rs
 * @brief Runtime configuration for MasterBot
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

//! Configuration loading.
//!
//! Settings come from three places, in increasing priority: baked defaults,
//! an optional `config.json`, and environment variables (usually supplied
//! through `.env`). The API credential is only ever read from the environment.

use std::{env, fs, io, path::Path, time::Duration};

use serde::Deserialize;

/// Path to the JSON configuration file that holds runtime defaults.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Environment variable carrying the text generation API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY_NEW";

/// Environment variable that overrides the configured model name.
pub const MODEL_ENV: &str = "MASTERBOT_MODEL";

/// Strongly typed representation of `config.json`.
///
/// # Details
/// Every field carries a serde default so a partial file (or `{}`) is valid.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Generation model identifier, e.g. `gemini-1.5-pro`.
    #[serde(default = "fallback_model")]
    pub model: String,
    /// Scheme and host of the generation API.
    #[serde(default = "fallback_api_base_url")]
    pub api_base_url: String,
    /// Upper bound for a single generation request.
    #[serde(default = "fallback_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Microphone capture window per utterance.
    #[serde(default = "fallback_record_seconds")]
    pub record_seconds: u64,
    /// Location of the GGML Whisper model used for recognition.
    #[serde(default = "fallback_whisper_model_path")]
    pub whisper_model_path: String,
    /// Speech program override; the platform default is used when unset.
    #[serde(default)]
    pub tts_command: Option<String>,
    /// Also stop the voice path when the recognizer backend is unreachable.
    #[serde(default)]
    pub gate_unavailable_sentinel: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: fallback_model(),
            api_base_url: fallback_api_base_url(),
            request_timeout_secs: fallback_request_timeout_secs(),
            record_seconds: fallback_record_seconds(),
            whisper_model_path: fallback_whisper_model_path(),
            tts_command: None,
            gate_unavailable_sentinel: false,
        }
    }
}

impl AppConfig {
    /// Timeout applied to each generation request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Length of a single microphone capture.
    pub fn record_duration(&self) -> Duration {
        Duration::from_secs(self.record_seconds.max(1))
    }

    /// API base URL without a trailing slash.
    pub fn base_url_trimmed(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Replaces the model when an override is present and non-blank.
    pub fn with_model_override(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        self
    }
}

/// Loads configuration from `path`, falling back to baked defaults.
///
/// # Details
/// A missing file is normal and only logged at debug level. An unreadable or
/// malformed file is logged as a warning. Either way the defaults are used, so
/// configuration problems never stop the assistant from starting. The
/// `MASTERBOT_MODEL` environment variable is applied last.
///
/// # Arguments
/// * `path` - Location of the JSON configuration file.
///
/// # Returns
/// * `AppConfig` - The loaded or default configuration.
pub fn load_app_config(path: &Path) -> AppConfig {
    let config = match fs::read_to_string(path) {
        Ok(raw) => parse_app_config(&raw).unwrap_or_else(|err| {
            tracing::warn!("Config parse error ({}): {}", path.display(), err);
            AppConfig::default()
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            AppConfig::default()
        }
        Err(err) => {
            tracing::warn!("Config load error ({}): {}", path.display(), err);
            AppConfig::default()
        }
    };
    config.with_model_override(env::var(MODEL_ENV).ok())
}

/// Parses the JSON body of a configuration file.
pub fn parse_app_config(raw: &str) -> serde_json::Result<AppConfig> {
    serde_json::from_str(raw)
}

/// Reads the generation API key from the environment.
///
/// # Returns
/// * `Some(key)` - A non-blank credential.
/// * `None` - The variable is unset or blank.
pub fn api_key_from_env() -> Option<String> {
    normalize_api_key(env::var(API_KEY_ENV).ok())
}

/// Trims a raw credential and discards blank values.
pub fn normalize_api_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn fallback_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn fallback_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn fallback_request_timeout_secs() -> u64 {
    60
}

fn fallback_record_seconds() -> u64 {
    5
}

fn fallback_whisper_model_path() -> String {
    "models/ggml-base.en.bin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_app_config("{}").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model, "gemini-1.5-pro");
        assert!(!config.gate_unavailable_sentinel);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config =
            parse_app_config(r#"{"model": "gemini-1.5-flash", "record_seconds": 8}"#).expect("parse");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.record_duration(), Duration::from_secs(8));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_app_config(&dir.path().join("absent.json"));
        assert_eq!(config.api_base_url, fallback_api_base_url());
    }

    #[test]
    fn malformed_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ not json").expect("write");
        let config = load_app_config(file.path());
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn file_values_are_loaded() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"tts_command": "espeak-ng", "gate_unavailable_sentinel": true}}"#)
            .expect("write");
        let config = load_app_config(file.path());
        assert_eq!(config.tts_command.as_deref(), Some("espeak-ng"));
        assert!(config.gate_unavailable_sentinel);
    }

    #[test]
    fn model_override_ignores_blank() {
        let config = AppConfig::default().with_model_override(Some("  ".into()));
        assert_eq!(config.model, "gemini-1.5-pro");
        let config = AppConfig::default().with_model_override(Some("gemini-pro".into()));
        assert_eq!(config.model, "gemini-pro");
    }

    #[test]
    fn record_duration_is_never_zero() {
        let config = AppConfig {
            record_seconds: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.record_duration(), Duration::from_secs(1));
    }

    #[test]
    fn api_key_normalization() {
        assert_eq!(normalize_api_key(None), None);
        assert_eq!(normalize_api_key(Some("   ".into())), None);
        assert_eq!(normalize_api_key(Some(" abc \n".into())), Some("abc".into()));
    }
}
