//! Engine resolution and concurrent fan-out over engines.
//!
//! An engine is a `provider[:model]` identifier. For each requested engine
//! the [`Dispatcher`] resolves the model, the provider and the API key,
//! compacts the message if it does not fit the model window, and asks the
//! provider for completions.
//!
//! With one engine, any failure is the caller's failure. With several, each
//! engine runs in its own tokio task and a failing engine is logged and left
//! out of the result map, so one slow or broken backend never costs the
//! caller the answers of the others.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::Message;
use crate::context::{Compactor, SummarizerConfig};
use crate::error::AskError;
use crate::providers::ProviderRegistry;

/// Default model for `openai` engines given without a model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
/// Default model for `cohere` engines given without a model.
pub const DEFAULT_COHERE_MODEL: &str = "command-xlarge-nightly";

// ── EngineId ───────────────────────────────────────────────────────

/// A parsed `provider[:model]` engine identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineId {
    pub provider: String,
    /// `None` selects the provider's default model.
    pub model: Option<String>,
}

impl EngineId {
    /// Parse `provider` or `provider:model`. Only the first `:` separates
    /// the two, so model names may contain colons. Surrounding whitespace
    /// is ignored and an empty model means "default".
    pub fn parse(engine: &str) -> Result<Self, AskError> {
        let engine = engine.trim();
        let (provider, model) = match engine.split_once(':') {
            Some((provider, model)) => (provider.trim(), Some(model.trim())),
            None => (engine, None),
        };

        if provider.is_empty() {
            return Err(AskError::InvalidEngine(engine.to_string()));
        }

        Ok(Self {
            provider: provider.to_string(),
            model: model.filter(|m| !m.is_empty()).map(str::to_string),
        })
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}:{model}", self.provider),
            None => f.write_str(&self.provider),
        }
    }
}

// ── DispatchConfig ─────────────────────────────────────────────────

/// Read-only settings shared by every engine unit of a dispatch.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Provider name to default model.
    pub provider_models: HashMap<String, String>,
    /// How over-budget messages are summarized.
    pub summarizer: SummarizerConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            provider_models: HashMap::from([
                ("openai".to_string(), DEFAULT_OPENAI_MODEL.to_string()),
                ("cohere".to_string(), DEFAULT_COHERE_MODEL.to_string()),
            ]),
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl DispatchConfig {
    /// Set the default model for `provider`.
    pub fn with_provider_model(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider_models.insert(provider.into(), model.into());
        self
    }

    pub fn with_summarizer(mut self, summarizer: SummarizerConfig) -> Self {
        self.summarizer = summarizer;
        self
    }
}

// ── EngineCallResult ───────────────────────────────────────────────

/// Outcome of one engine unit.
#[derive(Debug)]
pub struct EngineCallResult {
    /// `provider:model` once the model is resolved, otherwise the engine
    /// identifier as requested.
    pub engine_key: String,
    pub outcome: Result<Vec<String>, AskError>,
}

impl EngineCallResult {
    fn failed(engine_key: impl Into<String>, err: AskError) -> Self {
        Self {
            engine_key: engine_key.into(),
            outcome: Err(err),
        }
    }
}

// ── Dispatcher ─────────────────────────────────────────────────────

/// Sends a message to one or more engines.
///
/// Cheap to clone: the registry, keys and config are shared behind `Arc`s
/// and never mutated during a dispatch.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    api_keys: Arc<HashMap<String, String>>,
    config: Arc<DispatchConfig>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers_with_keys: Vec<&String> = self.api_keys.keys().collect();
        providers_with_keys.sort();
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("api_keys_for", &providers_with_keys)
            .field("config", &self.config)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        registry: ProviderRegistry,
        api_keys: HashMap<String, String>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            api_keys: Arc::new(api_keys),
            config: Arc::new(config),
        }
    }

    /// Ask every engine in `engines` and collect completions keyed by
    /// `provider:model`.
    ///
    /// - no engines: [`AskError::NoEngines`];
    /// - one engine: its error, if any, is returned as is;
    /// - several engines: run concurrently, failures are logged and the
    ///   engine is absent from the map, which may therefore be empty.
    pub async fn dispatch(
        &self,
        engines: &[String],
        message: &Message,
    ) -> Result<HashMap<String, Vec<String>>, AskError> {
        match engines {
            [] => Err(AskError::NoEngines),
            [engine] => {
                let result = self.process_engine(engine, message).await;
                let responses = result.outcome?;
                Ok(HashMap::from([(result.engine_key, responses)]))
            }
            _ => Ok(self.dispatch_concurrently(engines, message).await),
        }
    }

    async fn dispatch_concurrently(
        &self,
        engines: &[String],
        message: &Message,
    ) -> HashMap<String, Vec<String>> {
        let mut js: JoinSet<EngineCallResult> = JoinSet::new();

        for engine in engines {
            let this = self.clone();
            let engine = engine.clone();
            let message = message.clone();
            js.spawn(async move { this.process_engine(&engine, &message).await });
        }
        debug!("Dispatched to {} engines", engines.len());

        let mut responses = HashMap::with_capacity(engines.len());
        while let Some(joined) = js.join_next().await {
            match joined {
                Ok(EngineCallResult {
                    engine_key,
                    outcome: Ok(completions),
                }) => {
                    responses.insert(engine_key, completions);
                }
                Ok(EngineCallResult {
                    engine_key,
                    outcome: Err(e),
                }) => {
                    error!("Engine {engine_key} dropped from results: {e}");
                }
                Err(e) => {
                    error!("Engine task failed to complete: {e}");
                }
            }
        }

        info!(
            "{} of {} engines answered",
            responses.len(),
            engines.len()
        );
        responses
    }

    /// Parse `engine` and run its unit.
    pub async fn process_engine(&self, engine: &str, message: &Message) -> EngineCallResult {
        match EngineId::parse(engine) {
            Ok(id) => self.call_engine(&id, message).await,
            Err(e) => EngineCallResult::failed(engine.trim(), e),
        }
    }

    /// Resolve `engine`, compact `message` to its window if needed, and ask it.
    pub async fn call_engine(&self, engine: &EngineId, message: &Message) -> EngineCallResult {
        let provider_name = engine.provider.as_str();

        let model = match engine
            .model
            .as_deref()
            .or_else(|| self.config.provider_models.get(provider_name).map(String::as_str))
        {
            Some(model) => model,
            None => {
                return EngineCallResult::failed(
                    engine.to_string(),
                    AskError::NoProviderModel(provider_name.to_string()),
                );
            }
        };
        let engine_key = format!("{provider_name}:{model}");

        let Some(provider) = self.registry.get(provider_name) else {
            return EngineCallResult::failed(
                engine_key,
                AskError::NoEngine(provider_name.to_string()),
            );
        };
        let Some(api_key) = self.api_keys.get(provider_name) else {
            return EngineCallResult::failed(
                engine_key,
                AskError::NoApiKey(provider_name.to_string()),
            );
        };

        let outcome = async {
            let limit = provider.max_token_limit(model);
            let tokens = provider.count_tokens(model, &message.full_prompt())?;
            info!("Asking {engine_key} ({tokens} tokens, limit {limit})");
            trace!("Prompt for {engine_key}: {}", message.full_prompt());

            let compactor = Compactor::new(&*provider, model, api_key, &self.config.summarizer);
            let message = if tokens > limit {
                compactor.compact(message.clone(), limit).await?
            } else {
                message.clone()
            };

            provider.ask(&message, model, api_key).await
        }
        .await;

        match &outcome {
            Ok(responses) => trace!("Engine {engine_key} returned response: {responses:?}"),
            Err(e) => error!("Engine {engine_key} returned error: {e}"),
        }

        EngineCallResult {
            engine_key,
            outcome,
        }
    }
}
