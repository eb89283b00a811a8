/*
 * @file session.rs
 * @brief Session state: transcript, output mode and document context
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

//! Per-session state owned by the controller.
//!
//! Nothing here is persisted. A reset drops the transcript and the extracted
//! document text and returns the selectors to their defaults.

use std::fmt;
use std::str::FromStr;

/// Who said a transcript line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label shown next to the message.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "🧑‍💻 You",
            Speaker::Assistant => "MasterBot 👑",
        }
    }
}

/// One line of the chat transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered, append-only log of chat exchanges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Appends a user message followed by the assistant's reply.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::User,
            text: user.into(),
        });
        self.entries.push(TranscriptEntry {
            speaker: Speaker::Assistant,
            text: assistant.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Which side effects follow a successful generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    TextOnly,
    VoiceOnly,
    #[default]
    Both,
}

impl OutputMode {
    /// Whether the response text is rendered.
    pub fn shows_text(self) -> bool {
        matches!(self, OutputMode::TextOnly | OutputMode::Both)
    }

    /// Whether the response is spoken.
    pub fn speaks(self) -> bool {
        matches!(self, OutputMode::VoiceOnly | OutputMode::Both)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::TextOnly => "Text Only",
            OutputMode::VoiceOnly => "Voice Only",
            OutputMode::Both => "Both",
        })
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "text" | "textonly" => Ok(OutputMode::TextOnly),
            "voice" | "voiceonly" => Ok(OutputMode::VoiceOnly),
            "both" => Ok(OutputMode::Both),
            _ => Err(format!(
                "unknown output mode '{}' (expected text, voice or both)",
                s.trim()
            )),
        }
    }
}

/// The feature picked in the sidebar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Chat,
    PdfUpload,
    VoiceAssistant,
}

impl Mode {
    /// Page heading for the mode.
    pub fn title(self) -> &'static str {
        match self {
            Mode::Chat => "💬 MasterBot Chat",
            Mode::PdfUpload => "📄 Upload a PDF Document",
            Mode::VoiceAssistant => "🎤 MasterBot Voice Assistant",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Chat => "💬 Chat with MasterBot",
            Mode::PdfUpload => "📄 Upload a PDF",
            Mode::VoiceAssistant => "🎤 Voice Assistant",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "chat" => Ok(Mode::Chat),
            "pdf" | "pdfupload" | "document" => Ok(Mode::PdfUpload),
            "voice" | "voiceassistant" => Ok(Mode::VoiceAssistant),
            _ => Err(format!(
                "unknown mode '{}' (expected chat, pdf or voice)",
                s.trim()
            )),
        }
    }
}

fn normalize_choice(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Everything a session remembers between user actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    transcript: Transcript,
    output_mode: OutputMode,
    mode: Mode,
    document_text: Option<String>,
}

impl Session {
    /// Fresh session with the given selectors.
    pub fn new(mode: Mode, output_mode: OutputMode) -> Self {
        Self {
            mode,
            output_mode,
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Text of the most recently uploaded document, if any.
    pub fn document_text(&self) -> Option<&str> {
        self.document_text.as_deref()
    }

    /// Replaces the document context with a new extraction.
    pub fn set_document_text(&mut self, text: String) {
        self.document_text = Some(text);
    }

    /// Drops the transcript and document; selectors return to defaults.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.document_text = None;
        self.output_mode = OutputMode::default();
        self.mode = Mode::default();
    }
}
