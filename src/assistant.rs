/*
 * @file assistant.rs
 * @brief Session controller that routes MasterBot's chat, PDF and voice flows
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

//! Interaction controller.
//!
//! Each user action is a straight line: acquire input, optionally extract or
//! listen, generate, then render and/or speak according to the output mode.
//! Failures end the current action with a message to the user and leave the
//! session untouched; nothing is retried.

use std::sync::Arc;

use crate::ai::TextGenerator;
use crate::error::GenerationError;
use crate::listen::{is_not_understood, is_unavailable, SpeechInput, SERVICE_UNAVAILABLE};
use crate::pdf::TextExtractor;
use crate::session::{Mode, OutputMode, Session, Transcript};
use crate::speech::SpeechOutput;

/// Rendering boundary between the controller and whatever UI hosts it.
pub trait Presenter: Send + Sync {
    /// Shows a generated answer.
    fn show_response(&self, text: &str);
    /// Echoes what the speech recognizer heard.
    fn show_user_said(&self, text: &str);
    /// Shows the text extracted from an uploaded document.
    fn show_document(&self, text: &str);
    /// Shows a status line such as "Listening...".
    fn show_notice(&self, message: &str);
    /// Shows a failure.
    fn show_error(&self, message: &str);
}

/// The external services a controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn TextGenerator>,
    pub extractor: Arc<dyn TextExtractor>,
    pub listener: Arc<dyn SpeechInput>,
    pub voice: Arc<dyn SpeechOutput>,
}

/// Result of one user action, after it has been presented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The generator produced this answer.
    Answered(String),
    /// A precondition failed before anything was generated.
    Rejected(String),
    /// The recognizer returned a sentinel that stops the voice path.
    NotUnderstood(String),
    /// Generation failed.
    Failed(GenerationError),
}

/// Builds the prompt for a document question.
pub fn document_prompt(document_text: &str, question: &str) -> String {
    format!("Context: {}\n\nQuestion: {}", document_text, question)
}

/// Owns the session and dispatches the three entry points.
///
/// # Details
/// Blocking collaborators (microphone, speech synthesizer, PDF parsing) run on
/// tokio's blocking pool and are awaited before the entry point continues, so
/// at most one call to each collaborator is in flight.
pub struct Assistant {
    collaborators: Collaborators,
    presenter: Arc<dyn Presenter>,
    session: Session,
    gate_unavailable_sentinel: bool,
}

impl Assistant {
    /// Creates a controller over `session`.
    pub fn new(
        collaborators: Collaborators,
        presenter: Arc<dyn Presenter>,
        session: Session,
    ) -> Self {
        Self {
            collaborators,
            presenter,
            session,
            gate_unavailable_sentinel: false,
        }
    }

    /// Also stop the voice path on the "service unavailable" sentinel.
    pub fn with_unavailable_gate(mut self, enabled: bool) -> Self {
        self.gate_unavailable_sentinel = enabled;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        self.session.transcript()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.session.output_mode()
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        tracing::debug!(%mode, "output mode selected");
        self.session.set_output_mode(mode);
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.session.set_mode(mode);
    }

    /// Starts a new session: transcript and document are dropped.
    pub fn reset(&mut self) {
        tracing::info!("starting new session");
        self.session.reset();
    }

    /// Sends a chat message and records the exchange.
    ///
    /// # Details
    /// On success the user message and the answer are appended to the
    /// transcript, in that order, before the answer is delivered. On failure
    /// the transcript is left as it was.
    ///
    /// # Arguments
    /// * `text` - The user's message; empty messages are rejected.
    pub async fn submit_chat_message(&mut self, text: &str) -> Outcome {
        if text.is_empty() {
            return self.reject("Type a message before sending.");
        }
        match self.collaborators.generator.generate(text).await {
            Ok(response) => {
                self.session
                    .transcript_mut()
                    .push_exchange(text, response.clone());
                self.deliver(&response).await;
                Outcome::Answered(response)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Extracts and stores the text of a newly uploaded document.
    ///
    /// # Details
    /// Any previous document context is replaced, even when the new document
    /// has no extractable text.
    ///
    /// # Returns
    /// The extracted text, possibly empty.
    pub async fn upload_document(&mut self, document: Vec<u8>) -> String {
        let extractor = self.collaborators.extractor.clone();
        let text = match tokio::task::spawn_blocking(move || extractor.extract(&document)).await
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Extraction worker failed: {}", err);
                String::new()
            }
        };
        if text.is_empty() {
            self.presenter
                .show_notice("No extractable text found in this document.");
        } else {
            self.presenter.show_document(&text);
        }
        self.session.set_document_text(text.clone());
        text
    }

    /// Answers a question about the current document.
    ///
    /// # Details
    /// When `document` is given it is extracted first and becomes the new
    /// context. The answer is delivered but not added to the transcript.
    ///
    /// # Arguments
    /// * `document` - Optional newly uploaded PDF bytes.
    /// * `question` - The user's question.
    pub async fn submit_document_question(
        &mut self,
        document: Option<Vec<u8>>,
        question: &str,
    ) -> Outcome {
        if let Some(bytes) = document {
            self.upload_document(bytes).await;
        }
        let prompt = match self.session.document_text() {
            Some(text) if !text.is_empty() => document_prompt(text, question),
            _ => return self.reject("Upload a PDF with extractable text first."),
        };
        let generator = self.collaborators.generator.clone();
        let result = match tokio::spawn(async move { generator.generate(&prompt).await }).await {
            Ok(result) => result,
            Err(err) => Err(GenerationError::Service(format!(
                "generation task failed: {}",
                err
            ))),
        };
        match result {
            Ok(response) => {
                self.deliver(&response).await;
                Outcome::Answered(response)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Listens with the default speech input and answers what was heard.
    pub async fn submit_voice_query(&mut self) -> Outcome {
        let listener = self.collaborators.listener.clone();
        self.submit_voice_query_from(listener).await
    }

    /// Listens with `listener` and answers what was heard.
    ///
    /// # Details
    /// The recognized text is always echoed. The "couldn't understand"
    /// sentinel stops the flow before generation; the "service unavailable"
    /// sentinel only does when the unavailable gate is enabled.
    pub async fn submit_voice_query_from(&mut self, listener: Arc<dyn SpeechInput>) -> Outcome {
        self.presenter.show_notice("🎙️ Listening...");
        let heard = match tokio::task::spawn_blocking(move || listener.listen()).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Listening worker failed: {}", err);
                SERVICE_UNAVAILABLE.to_string()
            }
        };
        self.presenter.show_user_said(&heard);
        if is_not_understood(&heard) || (self.gate_unavailable_sentinel && is_unavailable(&heard))
        {
            tracing::info!("voice query stopped: {}", heard);
            return Outcome::NotUnderstood(heard);
        }
        match self.collaborators.generator.generate(&heard).await {
            Ok(response) => {
                self.deliver(&response).await;
                Outcome::Answered(response)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Renders and/or speaks a response according to the output mode.
    async fn deliver(&self, response: &str) {
        let mode = self.session.output_mode();
        if mode.shows_text() {
            self.presenter.show_response(response);
        }
        if mode.speaks() {
            self.speak(response).await;
        }
    }

    async fn speak(&self, text: &str) {
        let voice = self.collaborators.voice.clone();
        let text = text.to_string();
        let result = match tokio::task::spawn_blocking(move || voice.speak(&text)).await {
            Ok(result) => result,
            Err(err) => Err(anyhow::anyhow!("speech worker failed: {}", err)),
        };
        if let Err(err) = result {
            tracing::warn!("TTS error: {:#}", err);
            self.presenter
                .show_notice(&format!("Could not speak the response: {}", err));
        }
    }

    fn reject(&self, message: &str) -> Outcome {
        self.presenter.show_notice(message);
        Outcome::Rejected(message.to_string())
    }

    fn fail(&self, err: GenerationError) -> Outcome {
        let model = self.collaborators.generator.model_name();
        if err.is_configuration() {
            tracing::error!(model, "{}", err);
        } else {
            tracing::warn!(model, "{}", err);
        }
        self.presenter.show_error(&err.to_string());
        Outcome::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GeminiClient;
    use crate::config::AppConfig;
    use crate::listen::NOT_UNDERSTOOD;
    use crate::pdf::join_page_texts;
    use crate::session::Speaker;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeGenerator {
        reply: Result<String, GenerationError>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: GenerationError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    struct FakeExtractor(String);

    impl TextExtractor for FakeExtractor {
        fn extract(&self, _document: &[u8]) -> String {
            self.0.clone()
        }
    }

    struct FakeListener(String);

    impl SpeechInput for FakeListener {
        fn listen(&self) -> String {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct FakeVoice {
        spoken: Mutex<Vec<String>>,
        broken: bool,
    }

    impl SpeechOutput for FakeVoice {
        fn speak(&self, text: &str) -> anyhow::Result<()> {
            if self.broken {
                anyhow::bail!("no audio device");
            }
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Shown {
        Response(String),
        UserSaid(String),
        Document(String),
        Notice(String),
        Error(String),
    }

    #[derive(Default)]
    struct RecordingPresenter {
        shown: Mutex<Vec<Shown>>,
    }

    impl RecordingPresenter {
        fn shown(&self) -> Vec<Shown> {
            self.shown.lock().unwrap().clone()
        }

        fn responses(&self) -> usize {
            self.shown()
                .iter()
                .filter(|s| matches!(s, Shown::Response(_)))
                .count()
        }
    }

    impl Presenter for RecordingPresenter {
        fn show_response(&self, text: &str) {
            self.shown.lock().unwrap().push(Shown::Response(text.into()));
        }
        fn show_user_said(&self, text: &str) {
            self.shown.lock().unwrap().push(Shown::UserSaid(text.into()));
        }
        fn show_document(&self, text: &str) {
            self.shown.lock().unwrap().push(Shown::Document(text.into()));
        }
        fn show_notice(&self, message: &str) {
            self.shown.lock().unwrap().push(Shown::Notice(message.into()));
        }
        fn show_error(&self, message: &str) {
            self.shown.lock().unwrap().push(Shown::Error(message.into()));
        }
    }

    struct Harness {
        assistant: Assistant,
        generator: Arc<FakeGenerator>,
        voice: Arc<FakeVoice>,
        presenter: Arc<RecordingPresenter>,
    }

    fn harness_with(generator: Arc<FakeGenerator>, heard: &str, document: &str) -> Harness {
        let voice = Arc::new(FakeVoice::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let collaborators = Collaborators {
            generator: generator.clone(),
            extractor: Arc::new(FakeExtractor(document.to_string())),
            listener: Arc::new(FakeListener(heard.to_string())),
            voice: voice.clone(),
        };
        let assistant = Assistant::new(collaborators, presenter.clone(), Session::default());
        Harness {
            assistant,
            generator,
            voice,
            presenter,
        }
    }

    fn harness(reply: &str) -> Harness {
        harness_with(FakeGenerator::replying(reply), "What time is it?", "Hello\nWorld")
    }

    fn spoken(h: &Harness) -> Vec<String> {
        h.voice.spoken.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn chat_success_appends_user_then_assistant() {
        let mut h = harness("Paris");
        let outcome = h.assistant.submit_chat_message("Capital of France?").await;

        assert_eq!(outcome, Outcome::Answered("Paris".into()));
        let entries = h.assistant.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].speaker, Speaker::User);
        assert_eq!(entries[0].text, "Capital of France?");
        assert_eq!(entries[1].speaker, Speaker::Assistant);
        assert_eq!(entries[1].text, "Paris");
        assert_eq!(h.generator.prompts(), vec!["Capital of France?"]);
    }

    #[tokio::test]
    async fn chat_failure_leaves_transcript_untouched() {
        let mut h = harness_with(
            FakeGenerator::failing(GenerationError::Service("quota".into())),
            "",
            "",
        );
        let outcome = h.assistant.submit_chat_message("Hello?").await;

        assert!(matches!(outcome, Outcome::Failed(GenerationError::Service(_))));
        assert!(h.assistant.transcript().is_empty());
        assert!(spoken(&h).is_empty());
        assert_eq!(
            h.presenter.shown(),
            vec![Shown::Error("Service error: quota".into())]
        );
    }

    #[tokio::test]
    async fn empty_chat_message_is_rejected_without_generation() {
        let mut h = harness("unused");
        let outcome = h.assistant.submit_chat_message("").await;
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert!(h.generator.prompts().is_empty());
        assert!(h.assistant.transcript().is_empty());
    }

    #[tokio::test]
    async fn whitespace_chat_message_is_still_sent() {
        let mut h = harness("Hello?");
        let outcome = h.assistant.submit_chat_message("   ").await;
        assert_eq!(outcome, Outcome::Answered("Hello?".into()));
        assert_eq!(h.generator.prompts(), vec!["   "]);
        let entries = h.assistant.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "   ");
        assert_eq!(entries[1].text, "Hello?");
    }

    #[tokio::test]
    async fn text_only_never_speaks() {
        let mut h = harness("answer");
        h.assistant.set_output_mode(OutputMode::TextOnly);
        h.assistant.submit_chat_message("q").await;
        assert!(spoken(&h).is_empty());
        assert_eq!(h.presenter.responses(), 1);
    }

    #[tokio::test]
    async fn voice_only_speaks_once_without_rendering() {
        let mut h = harness("answer");
        h.assistant.set_output_mode(OutputMode::VoiceOnly);
        h.assistant.submit_chat_message("q").await;
        assert_eq!(spoken(&h), vec!["answer"]);
        assert_eq!(h.presenter.responses(), 0);
    }

    #[tokio::test]
    async fn both_renders_and_speaks_once() {
        let mut h = harness("answer");
        h.assistant
            .submit_document_question(Some(b"%PDF".to_vec()), "q")
            .await;
        assert_eq!(spoken(&h), vec!["answer"]);
        assert_eq!(h.presenter.responses(), 1);
    }

    #[tokio::test]
    async fn voice_only_voice_query_echoes_input_and_speaks_once() {
        let mut h = harness("It is noon.");
        h.assistant.set_output_mode(OutputMode::VoiceOnly);

        let outcome = h.assistant.submit_voice_query().await;

        assert_eq!(outcome, Outcome::Answered("It is noon.".into()));
        assert!(h
            .presenter
            .shown()
            .contains(&Shown::UserSaid("What time is it?".into())));
        assert_eq!(h.presenter.responses(), 0);
        assert_eq!(spoken(&h), vec!["It is noon."]);
    }

    #[tokio::test]
    async fn text_only_document_question_never_speaks() {
        let mut h = harness("A greeting.");
        h.assistant.set_output_mode(OutputMode::TextOnly);

        let outcome = h
            .assistant
            .submit_document_question(Some(b"%PDF".to_vec()), "What is this?")
            .await;

        assert_eq!(outcome, Outcome::Answered("A greeting.".into()));
        assert!(spoken(&h).is_empty());
        assert_eq!(h.presenter.responses(), 1);
    }

    #[tokio::test]
    async fn speech_failure_does_not_fail_the_answer() {
        let generator = FakeGenerator::replying("answer");
        let presenter = Arc::new(RecordingPresenter::default());
        let collaborators = Collaborators {
            generator: generator.clone(),
            extractor: Arc::new(FakeExtractor(String::new())),
            listener: Arc::new(FakeListener(String::new())),
            voice: Arc::new(FakeVoice {
                spoken: Mutex::new(Vec::new()),
                broken: true,
            }),
        };
        let mut assistant = Assistant::new(collaborators, presenter.clone(), Session::default());

        let outcome = assistant.submit_chat_message("q").await;

        assert_eq!(outcome, Outcome::Answered("answer".into()));
        assert_eq!(assistant.transcript().len(), 2);
        assert!(presenter
            .shown()
            .iter()
            .any(|s| matches!(s, Shown::Notice(m) if m.contains("no audio device"))));
    }

    #[tokio::test]
    async fn document_question_builds_context_prompt() {
        let extracted = join_page_texts(["Hello", "", "World"]);
        let mut h = harness_with(FakeGenerator::replying("A greeting."), "", &extracted);

        let text = h.assistant.upload_document(b"%PDF-1.5".to_vec()).await;
        assert_eq!(text, "Hello\nWorld");
        let outcome = h.assistant.submit_document_question(None, "What is this?").await;

        assert_eq!(outcome, Outcome::Answered("A greeting.".into()));
        assert_eq!(
            h.generator.prompts(),
            vec!["Context: Hello\nWorld\n\nQuestion: What is this?"]
        );
        assert!(h.assistant.transcript().is_empty());
        assert_eq!(h.presenter.shown()[0], Shown::Document("Hello\nWorld".into()));
    }

    #[tokio::test]
    async fn document_bytes_are_extracted_on_submit() {
        let mut h = harness("ok");
        let outcome = h
            .assistant
            .submit_document_question(Some(b"%PDF".to_vec()), "Summary?")
            .await;
        assert_eq!(outcome, Outcome::Answered("ok".into()));
        assert_eq!(h.assistant.session().document_text(), Some("Hello\nWorld"));
    }

    #[tokio::test]
    async fn document_question_needs_document_text() {
        let mut h = harness("unused");
        let outcome = h.assistant.submit_document_question(None, "Anything?").await;
        assert!(matches!(outcome, Outcome::Rejected(_)));

        let mut h = harness_with(FakeGenerator::replying("unused"), "", "");
        let outcome = h
            .assistant
            .submit_document_question(Some(b"scan".to_vec()), "Anything?")
            .await;
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert!(h.generator.prompts().is_empty());
        assert_eq!(h.assistant.session().document_text(), Some(""));
    }

    #[tokio::test]
    async fn not_understood_sentinel_skips_generation() {
        let shouted = NOT_UNDERSTOOD.to_uppercase();
        let mut h = harness_with(FakeGenerator::replying("unused"), &shouted, "");

        let outcome = h.assistant.submit_voice_query().await;

        assert_eq!(outcome, Outcome::NotUnderstood(shouted.clone()));
        assert!(h.generator.prompts().is_empty());
        assert!(h.presenter.shown().contains(&Shown::UserSaid(shouted)));
    }

    #[tokio::test]
    async fn recognized_text_is_sent_to_generator() {
        let mut h = harness("It is noon.");
        let outcome = h.assistant.submit_voice_query().await;
        assert_eq!(outcome, Outcome::Answered("It is noon.".into()));
        assert_eq!(h.generator.prompts(), vec!["What time is it?"]);
        assert!(h.assistant.transcript().is_empty());
    }

    #[tokio::test]
    async fn unavailable_sentinel_only_gates_when_enabled() {
        let mut h = harness_with(FakeGenerator::replying("x"), SERVICE_UNAVAILABLE, "");
        h.assistant.submit_voice_query().await;
        assert_eq!(h.generator.prompts(), vec![SERVICE_UNAVAILABLE]);

        let h = harness_with(FakeGenerator::replying("x"), SERVICE_UNAVAILABLE, "");
        let mut assistant = h.assistant.with_unavailable_gate(true);
        let outcome = assistant.submit_voice_query().await;
        assert!(matches!(outcome, Outcome::NotUnderstood(_)));
        assert!(h.generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_transcript_and_restores_both() {
        let mut h = harness("a");
        h.assistant.set_output_mode(OutputMode::TextOnly);
        h.assistant.submit_chat_message("q").await;
        h.assistant.upload_document(Vec::new()).await;

        h.assistant.reset();

        assert!(h.assistant.transcript().is_empty());
        assert_eq!(h.assistant.output_mode(), OutputMode::Both);
        assert_eq!(h.assistant.session().document_text(), None);
    }

    #[tokio::test]
    async fn missing_credential_reports_configuration_error() {
        let presenter = Arc::new(RecordingPresenter::default());
        let generator = GeminiClient::new(&AppConfig::default(), None).expect("client");
        let collaborators = Collaborators {
            generator: Arc::new(generator),
            extractor: Arc::new(FakeExtractor(String::new())),
            listener: Arc::new(FakeListener(String::new())),
            voice: Arc::new(FakeVoice::default()),
        };
        let mut assistant = Assistant::new(collaborators, presenter, Session::default());

        let outcome = assistant.submit_chat_message("Hello").await;
        assert!(matches!(outcome, Outcome::Failed(ref err) if err.is_configuration()));

        assistant.set_mode(Mode::VoiceAssistant);
        assistant.set_output_mode(OutputMode::VoiceOnly);
        assert_eq!(assistant.mode(), Mode::VoiceAssistant);
        assert_eq!(assistant.output_mode(), OutputMode::VoiceOnly);
    }
}
