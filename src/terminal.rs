/*
 * @file terminal.rs
 * @brief Terminal presentation surface and MasterBot's main loop
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

//! Terminal front end.
//!
//! Wires the real collaborators together, then reads one line at a time from
//! stdin and dispatches it to the controller. Conversation output goes to
//! stdout; logs go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ai::GeminiClient;
use crate::assistant::{Assistant, Collaborators, Presenter};
use crate::commands::{help_text, parse_input, Command};
use crate::config::{self, load_app_config};
use crate::listen::{UtteranceSource, WhisperListener, WhisperRecognizer};
use crate::pdf::PdfExtractor;
use crate::session::{Mode, OutputMode, Session, Transcript};
use crate::speech::SystemVoice;

/// Start-up choices normally taken from the command line.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub mode: Mode,
    pub output_mode: OutputMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(config::DEFAULT_CONFIG_PATH),
            mode: Mode::default(),
            output_mode: OutputMode::default(),
        }
    }
}

/// [`Presenter`] that prints to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show_response(&self, text: &str) {
        println!("👑 MasterBot: {}", text);
    }

    fn show_user_said(&self, text: &str) {
        println!("🗣️ You said: {}", text);
    }

    fn show_document(&self, text: &str) {
        println!("Extracted Text from PDF:\n{}", text);
    }

    fn show_notice(&self, message: &str) {
        println!("{}", message);
    }

    fn show_error(&self, message: &str) {
        println!("❌ {}", message);
    }
}

/// Runs MasterBot until stdin closes or the user quits.
///
/// # Details
/// A missing API key is reported once at start-up; the loop still runs so
/// every non-generation feature stays available.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built or stdin fails.
pub async fn run(options: RunOptions) -> Result<()> {
    let config = load_app_config(&options.config_path);
    let presenter = Arc::new(TerminalPresenter);

    let generator = GeminiClient::from_env(&config).context("Failed to build generation client")?;
    if !generator.is_configured() {
        tracing::error!("{} is not set; generation is disabled", config::API_KEY_ENV);
        presenter.show_error(&format!(
            "Google API key is missing. Set the '{}' environment variable.",
            config::API_KEY_ENV
        ));
    }

    let recognizer = Arc::new(WhisperRecognizer::new(&config.whisper_model_path));
    let microphone = WhisperListener::new(
        recognizer,
        UtteranceSource::Microphone(config.record_duration()),
    );
    let collaborators = Collaborators {
        generator: Arc::new(generator),
        extractor: Arc::new(PdfExtractor),
        listener: Arc::new(microphone.clone()),
        voice: Arc::new(SystemVoice::new(config.tts_command.clone())),
    };
    let session = Session::new(options.mode, options.output_mode);
    let mut assistant = Assistant::new(collaborators, presenter, session)
        .with_unavailable_gate(config.gate_unavailable_sentinel);
    tracing::info!(model = %config.model, "MasterBot ready");

    println!("{}", banner(assistant.mode(), assistant.output_mode()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(assistant.mode())?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        if !handle_command(&mut assistant, &microphone, parse_input(&line)).await {
            break;
        }
    }
    println!("Goodbye 👋");
    Ok(())
}

/// Executes one parsed command.
///
/// # Returns
/// `false` when the user asked to quit.
async fn handle_command(
    assistant: &mut Assistant,
    microphone: &WhisperListener,
    command: Command,
) -> bool {
    match command {
        Command::Empty => {}
        Command::Message(text) => match assistant.mode() {
            Mode::Chat => {
                assistant.submit_chat_message(&text).await;
            }
            Mode::PdfUpload => {
                assistant.submit_document_question(None, &text).await;
            }
            Mode::VoiceAssistant => {
                println!("Use /listen to start listening.");
            }
        },
        Command::SwitchMode(mode) => {
            assistant.set_mode(mode);
            println!("{}", mode.title());
        }
        Command::Upload(path) => {
            assistant.set_mode(Mode::PdfUpload);
            if let Some(bytes) = read_upload(&path).await {
                assistant.upload_document(bytes).await;
            }
        }
        Command::Listen(file) => {
            assistant.set_mode(Mode::VoiceAssistant);
            match file {
                Some(path) => {
                    let listener = Arc::new(microphone.for_file(path));
                    assistant.submit_voice_query_from(listener).await;
                }
                None => {
                    assistant.submit_voice_query().await;
                }
            }
        }
        Command::Output(mode) => {
            assistant.set_output_mode(mode);
            println!("Output mode: {}", mode);
        }
        Command::NewSession => {
            assistant.reset();
            println!("{}", banner(assistant.mode(), assistant.output_mode()));
        }
        Command::History => print!("{}", format_transcript(assistant.transcript())),
        Command::Help => print!("{}", help_text()),
        Command::Quit => return false,
        Command::Invalid(message) => println!("{}", message),
        Command::Unknown(name) => println!("Unknown command /{}. Type /help.", name),
    }
    true
}

async fn read_upload(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::warn!("Upload failed for {}: {}", path.display(), err);
            println!("❌ Could not read {}: {}", path.display(), err);
            None
        }
    }
}

/// Header printed at start-up and after a session reset.
pub fn banner(mode: Mode, output_mode: OutputMode) -> String {
    format!(
        "MasterBot Features 👑\nMode: {}  |  Output: {}\n{}\n---\nType /help for commands.",
        mode,
        output_mode,
        mode.title()
    )
}

/// Renders the chat transcript, one labelled line per message.
pub fn format_transcript(transcript: &Transcript) -> String {
    if transcript.is_empty() {
        return "(no messages yet)\n".to_string();
    }
    transcript
        .entries()
        .iter()
        .map(|entry| format!("{}: {}\n", entry.speaker.label(), entry.text))
        .collect()
}

fn print_prompt(mode: Mode) -> Result<()> {
    let marker = match mode {
        Mode::Chat => "💬",
        Mode::PdfUpload => "📄",
        Mode::VoiceAssistant => "🎤",
    };
    print!("{} > ", marker);
    std::io::stdout().flush().context("Failed to flush stdout")
}
