/*
 * @file commands.rs
 * @brief Terminal command table and input parsing
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

//! Slash-command configuration and matching for the terminal surface.
//!
//! Each command stands in for a widget of the single-page UI: the sidebar
//! mode selector, the session reset button, the output-mode selector, the
//! file uploader and the start-listening button. Anything that is not a
//! command is a message for the current mode.

use std::path::PathBuf;

use crate::session::{Mode, OutputMode};

/// Static description of one slash command.
#[derive(Clone, Copy, Debug)]
pub struct CommandSpec {
    /// Primary name, without the leading slash.
    pub name: &'static str,
    /// Alternative names.
    pub aliases: &'static [&'static str],
    /// Argument synopsis shown in help.
    pub usage: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

/// Every command the terminal understands.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "chat",
        aliases: &[],
        usage: "",
        description: "Switch to chat with MasterBot",
    },
    CommandSpec {
        name: "pdf",
        aliases: &["document"],
        usage: "",
        description: "Switch to PDF question answering",
    },
    CommandSpec {
        name: "voice",
        aliases: &[],
        usage: "",
        description: "Switch to the voice assistant",
    },
    CommandSpec {
        name: "upload",
        aliases: &["open"],
        usage: "<file.pdf>",
        description: "Upload a PDF and extract its text",
    },
    CommandSpec {
        name: "listen",
        aliases: &["mic"],
        usage: "[file.wav]",
        description: "Start listening (or recognize a recorded WAV file)",
    },
    CommandSpec {
        name: "output",
        aliases: &[],
        usage: "<text|voice|both>",
        description: "Select the output mode",
    },
    CommandSpec {
        name: "new",
        aliases: &["reset"],
        usage: "",
        description: "Start a new session",
    },
    CommandSpec {
        name: "history",
        aliases: &[],
        usage: "",
        description: "Show the chat transcript",
    },
    CommandSpec {
        name: "help",
        aliases: &["?"],
        usage: "",
        description: "Show this help",
    },
    CommandSpec {
        name: "quit",
        aliases: &["exit", "bye"],
        usage: "",
        description: "Leave MasterBot",
    },
];

/// A parsed line of terminal input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    /// Free text for the current mode.
    Message(String),
    SwitchMode(Mode),
    Upload(PathBuf),
    Listen(Option<PathBuf>),
    Output(OutputMode),
    NewSession,
    History,
    Help,
    Quit,
    /// A known command used incorrectly; carries the explanation.
    Invalid(String),
    /// A slash command nobody recognizes.
    Unknown(String),
}

/// Finds the command whose name or alias equals `name` (case-insensitive).
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    let name = name.to_lowercase();
    COMMANDS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.iter().any(|alias| *alias == name))
}

/// Parses one line of user input.
///
/// # Details
/// Lines starting with `/` are commands; the first word selects the command
/// and the remainder is its argument. All other non-blank lines are messages.
pub fn parse_input(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(body) = line.strip_prefix('/') else {
        return Command::Message(line.to_string());
    };
    let (name, argument) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    let Some(spec) = find_command(name) else {
        return Command::Unknown(name.to_string());
    };
    match spec.name {
        "chat" => Command::SwitchMode(Mode::Chat),
        "pdf" => Command::SwitchMode(Mode::PdfUpload),
        "voice" => Command::SwitchMode(Mode::VoiceAssistant),
        "upload" if argument.is_empty() => Command::Invalid(usage(spec)),
        "upload" => Command::Upload(PathBuf::from(argument)),
        "listen" if argument.is_empty() => Command::Listen(None),
        "listen" => Command::Listen(Some(PathBuf::from(argument))),
        "output" => match argument.parse() {
            Ok(mode) => Command::Output(mode),
            Err(_) => Command::Invalid(usage(spec)),
        },
        "new" => Command::NewSession,
        "history" => Command::History,
        "help" => Command::Help,
        _ => Command::Quit,
    }
}

/// Generates the help listing from [`COMMANDS`].
pub fn help_text() -> String {
    let mut result = String::from("Commands:\n");
    for spec in COMMANDS {
        let head = if spec.usage.is_empty() {
            format!("/{}", spec.name)
        } else {
            format!("/{} {}", spec.name, spec.usage)
        };
        result.push_str(&format!("  {:<28} {}\n", head, spec.description));
    }
    result.push_str("Anything else is sent to the current mode.\n");
    result
}

fn usage(spec: &CommandSpec) -> String {
    format!("Usage: /{} {}", spec.name, spec.usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_input("  Hello there \n"), Command::Message("Hello there".into()));
        assert_eq!(parse_input("   "), Command::Empty);
    }

    #[test]
    fn mode_switches() {
        assert_eq!(parse_input("/chat"), Command::SwitchMode(Mode::Chat));
        assert_eq!(parse_input("/PDF"), Command::SwitchMode(Mode::PdfUpload));
        assert_eq!(parse_input("/voice"), Command::SwitchMode(Mode::VoiceAssistant));
    }

    #[test]
    fn upload_requires_a_path() {
        assert_eq!(
            parse_input("/upload  docs/My Paper.pdf "),
            Command::Upload(PathBuf::from("docs/My Paper.pdf"))
        );
        assert!(matches!(parse_input("/upload"), Command::Invalid(_)));
    }

    #[test]
    fn listen_takes_optional_file() {
        assert_eq!(parse_input("/listen"), Command::Listen(None));
        assert_eq!(
            parse_input("/mic clip.wav"),
            Command::Listen(Some(PathBuf::from("clip.wav")))
        );
    }

    #[test]
    fn output_mode_selection() {
        assert_eq!(parse_input("/output voice"), Command::Output(OutputMode::VoiceOnly));
        assert_eq!(parse_input("/output Text Only"), Command::Output(OutputMode::TextOnly));
        assert!(matches!(parse_input("/output loud"), Command::Invalid(_)));
    }

    #[test]
    fn aliases_and_unknowns() {
        assert_eq!(parse_input("/reset"), Command::NewSession);
        assert_eq!(parse_input("/exit"), Command::Quit);
        assert_eq!(parse_input("/?"), Command::Help);
        assert_eq!(parse_input("/dance now"), Command::Unknown("dance".into()));
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for spec in COMMANDS {
            assert!(help.contains(&format!("/{}", spec.name)));
        }
    }
}
