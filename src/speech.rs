/*
 * @file speech.rs
 * @brief Text-to-speech output for MasterBot
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

//! Text-to-speech functionality module.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Speaks text aloud, blocking until playback completes.
///
/// Callers must not issue overlapping calls; the controller awaits each one.
pub trait SpeechOutput: Send + Sync {
    /// Synthesizes and plays `text`.
    ///
    /// # Errors
    /// Returns an error if the text is blank or playback fails.
    fn speak(&self, text: &str) -> Result<()>;
}

/// Speech through the platform's command-line synthesizer.
///
/// # Details
/// Uses `say` on macOS and `espeak` elsewhere unless a program is configured.
/// The text is passed as a single argument and the call waits for the program
/// to exit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemVoice {
    program: String,
}

impl SystemVoice {
    /// Creates a voice using `program`, or the platform default when `None`.
    pub fn new(program: Option<String>) -> Self {
        let program = program
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| default_program().to_string());
        Self { program }
    }

    /// The synthesizer executable in use.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SystemVoice {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SpeechOutput for SystemVoice {
    fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot speak empty text");
        }
        let status = Command::new(&self.program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run {}", self.program))?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

fn default_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_program_depends_on_platform() {
        let voice = SystemVoice::default();
        if cfg!(target_os = "macos") {
            assert_eq!(voice.program(), "say");
        } else {
            assert_eq!(voice.program(), "espeak");
        }
        assert_eq!(SystemVoice::new(Some(" ".into())), voice);
    }

    #[test]
    fn speak_rejects_empty_text() {
        assert!(SystemVoice::new(Some("true".into())).speak("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn speak_succeeds_when_program_exits_cleanly() {
        assert!(SystemVoice::new(Some("true".into())).speak("Hello test").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn speak_fails_on_nonzero_exit() {
        assert!(SystemVoice::new(Some("false".into())).speak("failure case").is_err());
    }

    #[test]
    fn speak_fails_when_program_is_missing() {
        let voice = SystemVoice::new(Some("masterbot-no-such-synth".into()));
        assert!(voice.speak("hello").is_err());
    }
}
