/*
 * @file ai.rs
 * @brief Text generation client backed by the Gemini API
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

//! Text generation client.
//!
//! This module wraps Google's Gemini `generateContent` endpoint behind the
//! [`TextGenerator`] trait so the controller can be exercised with fakes.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{self, AppConfig};
use crate::error::GenerationError;

/// Anything that turns a prompt into a completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for `prompt`.
    ///
    /// # Errors
    /// * [`GenerationError::Configuration`] when no credential is available.
    /// * [`GenerationError::Service`] on any remote fault.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Model identifier used for logging.
    fn model_name(&self) -> &str;
}

/// Gemini REST client.
///
/// # Details
/// The client may be built without a credential. In that state it stays
/// usable as a value but every call to [`TextGenerator::generate`] fails with
/// a configuration error and nothing is sent over the network.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Subset of the `generateContent` response MasterBot reads.
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

/// Error envelope returned by Google APIs on non-2xx responses.
#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiClient {
    /// Builds a client from configuration and an optional credential.
    ///
    /// # Arguments
    /// * `config` - Model, base URL and timeout settings.
    /// * `api_key` - The credential, or `None` to build an unconfigured client.
    ///
    /// # Errors
    /// Returns a service error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            api_key: config::normalize_api_key(api_key),
            model: config.model.clone(),
            base_url: config.base_url_trimmed().to_string(),
        })
    }

    /// Builds a client using the credential from `GOOGLE_API_KEY_NEW`.
    ///
    /// # Errors
    /// Returns a service error if the HTTP client cannot be constructed. A
    /// missing credential is not an error here.
    pub fn from_env(config: &AppConfig) -> Result<Self, GenerationError> {
        Self::new(config, config::api_key_from_env())
    }

    /// Returns `true` when a credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(missing_key_error)?;
        let started = Instant::now();
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending generation request");

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            tracing::warn!(model = %self.model, %status, "generation request rejected");
            return Err(GenerationError::Service(format!("HTTP {}: {}", status, message)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Service(format!("malformed response: {}", err)))?;
        let text = response_text(body)?;
        tracing::info!(
            model = %self.model,
            response_len = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation finished"
        );
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn missing_key_error() -> GenerationError {
    GenerationError::Configuration(format!(
        "API key is missing. Set the '{}' environment variable.",
        config::API_KEY_ENV
    ))
}

/// Concatenates the text parts of the first candidate.
fn response_text(body: GenerateContentResponse) -> Result<String, GenerationError> {
    let block_reason = body.prompt_feedback.and_then(|f| f.block_reason);
    let Some(candidate) = body.candidates.into_iter().next() else {
        let reason = block_reason.unwrap_or_else(|| "no candidates".to_string());
        return Err(GenerationError::Service(format!(
            "response contained no text ({})",
            reason
        )));
    };
    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "empty candidate".to_string());
        return Err(GenerationError::Service(format!(
            "response contained no text ({})",
            reason
        )));
    }
    Ok(text)
}

/// Pulls the human-readable message out of an error body when possible.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if body.trim().is_empty() => "no response body".to_string(),
        _ => body.trim().to_string(),
    }
}
