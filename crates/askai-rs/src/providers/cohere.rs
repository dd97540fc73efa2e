//! Cohere backend (`/generate`).
//!
//! Cohere does not publish its tokenizer, so token counts use the
//! heuristic estimate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AskFuture, Provider};
use crate::Message;
use crate::api::HttpClient;
use crate::tokens::max_response_tokens;

pub const COHERE_API_BASE: &str = "https://api.cohere.ai/v1";

/// Input window of Cohere generation models.
pub const MAX_TOKENS_COHERE: usize = 2048;

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Deserialize, Debug)]
struct Generation {
    text: String,
}

/// The Cohere provider, registered as `"cohere"`.
#[derive(Debug, Clone)]
pub struct CohereProvider {
    http: HttpClient,
    base_url: String,
}

impl CohereProvider {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: COHERE_API_BASE.to_string(),
        }
    }

    /// Point the provider at a different API base (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Provider for CohereProvider {
    fn name(&self) -> &str {
        "cohere"
    }

    fn max_token_limit(&self, _model: &str) -> usize {
        MAX_TOKENS_COHERE
    }

    fn ask<'a>(&'a self, message: &'a Message, model: &'a str, api_key: &'a str) -> AskFuture<'a> {
        Box::pin(async move {
            let prompt = message.full_prompt();
            let max_tokens = max_response_tokens(&prompt, MAX_TOKENS_COHERE, None)?;
            debug!(
                "Cohere request: model={model}, prompt={} chars, max_tokens={max_tokens}",
                prompt.len()
            );

            let body = GenerateRequest {
                model,
                prompt: &prompt,
                max_tokens,
            };
            let url = format!("{}/generate", self.base_url);
            let response: GenerateResponse = self
                .http
                .post_json(self.name(), &url, api_key, &body)
                .await
                .map_err(|e| e.with_context("could not generate text completion"))?;

            Ok(response.generations.into_iter().map(|g| g.text).collect())
        })
    }
}
