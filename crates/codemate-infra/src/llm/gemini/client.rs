//! GeminiProvider -- [`CompletionProvider`] for the Gemini `generateContent` API.
//!
//! Every call carries the same decoding parameters and safety thresholds.
//! There is no retry; upstream failures are mapped onto [`LlmError`].
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the request header.

use std::time::Duration;

use codemate_core::llm::provider::CompletionProvider;
use codemate_types::chat::MessageRole;
use codemate_types::llm::{
    CompletionRequest, CompletionResponse, GenerationConfig, LlmError, SafetySetting, Usage,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GeminiPart, GenerateContentRequest,
    GenerateContentResponse,
};

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini completion provider.
///
/// A missing key is allowed at construction time: the request is then sent
/// without credentials and fails upstream with an authentication error.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiProvider {
    const API_KEY_HEADER: &'static str = "x-goog-api-key";

    pub fn new(api_key: Option<SecretString>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::block_only_high(),
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    fn to_gemini_request(&self, request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart::text(m.content.clone())],
            })
            .collect();

        GenerateContentRequest {
            contents,
            generation_config: (&self.generation_config).into(),
            safety_settings: self.safety_settings.clone(),
        }
    }
}

/// Map a non-2xx status and body onto an [`LlmError`].
fn status_error(status: reqwest::StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed(message),
        429 => LlmError::RateLimited(message),
        400 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Extract the reply text from a successful response.
fn into_completion(
    response: GenerateContentResponse,
    requested_model: &str,
) -> Result<CompletionResponse, LlmError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.clone())
    {
        return Err(LlmError::Blocked { reason });
    }

    let candidate = response
        .candidates
        .first()
        .ok_or(LlmError::EmptyResponse)?;
    let content = candidate.text();

    if content.is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST")) => LlmError::Blocked {
                reason: reason.to_string(),
            },
            _ => LlmError::EmptyResponse,
        });
    }

    let usage = response.usage_metadata.clone().unwrap_or_default();
    Ok(CompletionResponse {
        content,
        model: response
            .model_version
            .clone()
            .unwrap_or_else(|| requested_model.to_string()),
        finish_reason: candidate.finish_reason.clone(),
        usage: Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    })
}

impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest("no messages to send".to_string()));
        }

        let body = self.to_gemini_request(request);
        let url = self.url(&request.model);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header(Self::API_KEY_HEADER, key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_body));
        }

        let gemini_resp: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let completion = into_completion(gemini_resp, &request.model)?;
        debug!(
            model = %completion.model,
            output_tokens = completion.usage.output_tokens,
            "Gemini completion succeeded"
        );
        Ok(completion)
    }
}
