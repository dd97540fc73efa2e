//! OpenAI backend.
//!
//! Chat models (`gpt-3.5-turbo*`, `gpt-4*`) are called through
//! `/chat/completions` with the message as a single user turn; every other
//! model goes through the legacy `/completions` endpoint. Token counts are
//! exact, using the model's tiktoken encoding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AskFuture, Provider};
use crate::Message;
use crate::api::HttpClient;
use crate::error::AskError;
use crate::tokens::{Encoding, encoding_for_model, max_response_tokens};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Input window of `gpt-3.5-turbo` chat models.
pub const MAX_TOKENS_GPT35_CHAT: usize = 4096;

/// Input window assumed for completion models.
pub const MAX_TOKENS_GPT35_COMPLETION: usize = 4000;

/// Known input windows by model-name prefix, longest prefix first.
const MODEL_TOKEN_LIMITS: &[(&str, usize)] = &[
    ("gpt-4-32k", 32_768),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo-16k", 16_384),
    ("gpt-3.5-turbo", MAX_TOKENS_GPT35_CHAT),
];

/// Whether `model` is served by the chat completions endpoint.
pub fn is_chat_model(model: &str) -> bool {
    model.starts_with("gpt-3.5-turbo") || model.starts_with("gpt-4")
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    role: String,
    content: Option<String>,
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    prompt: &'a str,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    text: String,
}

// ── Provider ───────────────────────────────────────────────────────

/// The OpenAI provider, registered as `"openai"`.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: HttpClient,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    /// Point the provider at a different API base (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn chat(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: usize,
        api_key: &str,
    ) -> Result<Vec<String>, AskError> {
        let body = ChatRequest {
            model,
            max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let url = format!("{}/chat/completions", self.base_url);
        let response: ChatResponse = self
            .http
            .post_json(self.name(), &url, api_key, &body)
            .await
            .map_err(|e| e.with_context("could not create chat completion"))?;

        Ok(response
            .choices
            .into_iter()
            .filter(|c| c.message.role == "assistant")
            .map(|c| c.message.content.unwrap_or_default())
            .collect())
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: usize,
        api_key: &str,
    ) -> Result<Vec<String>, AskError> {
        let body = CompletionRequest {
            model,
            max_tokens,
            prompt,
        };
        let url = format!("{}/completions", self.base_url);
        let response: CompletionResponse = self
            .http
            .post_json(self.name(), &url, api_key, &body)
            .await
            .map_err(|e| e.with_context("could not create text completion"))?;

        Ok(response.choices.into_iter().map(|c| c.text).collect())
    }
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn max_token_limit(&self, model: &str) -> usize {
        MODEL_TOKEN_LIMITS
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map_or(MAX_TOKENS_GPT35_COMPLETION, |(_, limit)| *limit)
    }

    fn encoding(&self, model: &str) -> Option<Encoding> {
        encoding_for_model(model)
    }

    fn ask<'a>(&'a self, message: &'a Message, model: &'a str, api_key: &'a str) -> AskFuture<'a> {
        Box::pin(async move {
            let prompt = message.full_prompt();
            let max_tokens =
                max_response_tokens(&prompt, self.max_token_limit(model), self.encoding(model))?;
            debug!(
                "OpenAI request: model={model}, prompt={} chars, max_tokens={max_tokens}",
                prompt.len()
            );

            if is_chat_model(model) {
                self.chat(&prompt, model, max_tokens, api_key).await
            } else {
                self.complete(&prompt, model, max_tokens, api_key).await
            }
        })
    }
}
