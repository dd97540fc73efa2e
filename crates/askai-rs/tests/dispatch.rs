//! Integration tests for dispatch and compaction.
//!
//! These tests drive the public API with in-memory providers: nothing
//! leaves the process, but every engine unit goes through the same
//! resolve / compact / ask sequence as a real call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Barrier;

use askai_rs::{
    AskError, AskFuture, DispatchConfig, Dispatcher, ErrorKind, Message, Provider, ProviderRegistry,
};

/// Records every request and answers summarization requests with a short
/// note. Other requests are echoed back after an optional delay.
struct Recorder {
    name: &'static str,
    limit: usize,
    delay: Duration,
    requests: Arc<Mutex<Vec<Message>>>,
}

impl Recorder {
    fn new(name: &'static str, limit: usize) -> Self {
        Self {
            name,
            limit,
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Provider for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn max_token_limit(&self, _model: &str) -> usize {
        self.limit
    }

    fn ask<'a>(&'a self, message: &'a Message, model: &'a str, _key: &'a str) -> AskFuture<'a> {
        self.requests.lock().unwrap().push(message.clone());
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            if message.prompt == "Summarize:" {
                Ok(vec!["Noted.".to_string()])
            } else {
                Ok(vec![format!("{model}: {}", message.full_prompt())])
            }
        })
    }
}

/// Answers only once every other engine sharing its barrier has been
/// asked too.
struct Rendezvous {
    name: &'static str,
    barrier: Arc<Barrier>,
}

impl Provider for Rendezvous {
    fn name(&self) -> &str {
        self.name
    }

    fn max_token_limit(&self, _model: &str) -> usize {
        4096
    }

    fn ask<'a>(&'a self, _message: &'a Message, _model: &'a str, _key: &'a str) -> AskFuture<'a> {
        Box::pin(async move {
            self.barrier.wait().await;
            Ok(vec![format!("{} met", self.name)])
        })
    }
}

struct Failing;

impl Provider for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn max_token_limit(&self, _model: &str) -> usize {
        4096
    }

    fn ask<'a>(&'a self, _message: &'a Message, _model: &'a str, _key: &'a str) -> AskFuture<'a> {
        Box::pin(async { Err(AskError::provider("failing", "HTTP 503: unavailable")) })
    }
}

struct Panicking;

impl Provider for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn max_token_limit(&self, _model: &str) -> usize {
        4096
    }

    fn ask<'a>(&'a self, _message: &'a Message, _model: &'a str, _key: &'a str) -> AskFuture<'a> {
        Box::pin(async { explode() })
    }
}

fn explode() -> Result<Vec<String>, AskError> {
    panic!("backend bug")
}

fn keys_for(providers: &[&str]) -> HashMap<String, String> {
    providers
        .iter()
        .map(|p| (p.to_string(), "secret".to_string()))
        .collect()
}

fn config_for(providers: &[&str]) -> DispatchConfig {
    providers
        .iter()
        .fold(DispatchConfig::default(), |config, p| {
            config.with_provider_model(*p, "default-model")
        })
}

// ── End to end ───────────────────────────────────────────────────────

#[tokio::test]
async fn short_prompt_is_sent_verbatim() {
    let recorder = Recorder::new("mock", 4096);
    let requests = recorder.requests.clone();
    let dispatcher = Dispatcher::new(
        ProviderRegistry::new().with(recorder),
        keys_for(&["mock"]),
        config_for(&["mock"]),
    );

    let message = Message::prompt("Explain quantum computing");
    let out = dispatcher
        .dispatch(&["mock".to_string()], &message)
        .await
        .unwrap();

    assert_eq!(
        out["mock:default-model"],
        vec!["default-model: Explain quantum computing"]
    );
    assert_eq!(*requests.lock().unwrap(), vec![message]);
}

#[tokio::test]
async fn long_context_is_summarized_before_the_real_call() {
    let recorder = Recorder::new("mock", 60);
    let requests = recorder.requests.clone();
    let dispatcher = Dispatcher::new(
        ProviderRegistry::new().with(recorder),
        keys_for(&["mock"]),
        config_for(&["mock"]),
    );

    let context: String = (1..=20)
        .map(|i| format!("Finding number {i} is here. "))
        .collect();
    let message = Message::new("", context.trim_end());

    let out = dispatcher
        .dispatch(&["mock".to_string()], &message)
        .await
        .unwrap();
    assert_eq!(out.len(), 1);

    let requests = requests.lock().unwrap();
    let (last, summaries) = requests.split_last().unwrap();
    assert!(summaries.len() > 1);
    assert!(summaries.iter().all(|m| m.prompt == "Summarize:"));

    // The chunks sent for summarization cover the context in order.
    let rejoined: String = summaries.iter().map(|m| m.context.as_str()).collect();
    assert_eq!(rejoined, context.trim_end());

    // The real call carries only the joined summaries.
    assert_eq!(last.prompt, "");
    assert!(last.context.split(' ').all(|w| w == "Noted."));
    assert_eq!(last.context.split(' ').count(), summaries.len());
}

// ── Fan-out / fan-in ─────────────────────────────────────────────────

#[tokio::test]
async fn every_engine_answers() {
    let registry = ProviderRegistry::new()
        .with(Recorder::new("slow", 4096).with_delay(Duration::from_millis(50)))
        .with(Recorder::new("fast", 4096))
        .with(Recorder::new("medium", 4096).with_delay(Duration::from_millis(10)));
    let names = ["slow", "fast", "medium"];
    let dispatcher = Dispatcher::new(registry, keys_for(&names), config_for(&names));

    let engines: Vec<String> = vec!["slow".into(), "fast:tiny".into(), "medium".into()];
    let out = dispatcher
        .dispatch(&engines, &Message::prompt("ping"))
        .await
        .unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out["slow:default-model"], vec!["default-model: ping"]);
    assert_eq!(out["fast:tiny"], vec!["tiny: ping"]);
    assert_eq!(out["medium:default-model"], vec!["default-model: ping"]);
}

#[tokio::test]
async fn engines_are_asked_concurrently() {
    let barrier = Arc::new(Barrier::new(2));
    let registry = ProviderRegistry::new()
        .with(Rendezvous {
            name: "left",
            barrier: barrier.clone(),
        })
        .with(Rendezvous {
            name: "right",
            barrier,
        });
    let names = ["left", "right"];
    let dispatcher = Dispatcher::new(registry, keys_for(&names), config_for(&names));

    let engines: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let out = tokio::time::timeout(
        Duration::from_secs(5),
        dispatcher.dispatch(&engines, &Message::prompt("ping")),
    )
    .await
    .expect("engines waited on each other sequentially")
    .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out["left:default-model"], vec!["left met"]);
    assert_eq!(out["right:default-model"], vec!["right met"]);
}

#[tokio::test]
async fn single_failing_engine_fails_the_call() {
    let dispatcher = Dispatcher::new(
        ProviderRegistry::new().with(Failing),
        keys_for(&["failing"]),
        config_for(&["failing"]),
    );

    let err = dispatcher
        .dispatch(&["failing".to_string()], &Message::prompt("ping"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert_eq!(err.to_string(), "failing: HTTP 503: unavailable");
}

#[tokio::test]
async fn failing_and_panicking_engines_are_dropped() {
    let registry = ProviderRegistry::new()
        .with(Recorder::new("mock", 4096))
        .with(Failing)
        .with(Panicking);
    let names = ["mock", "failing", "panicking"];
    let dispatcher = Dispatcher::new(registry, keys_for(&names), config_for(&names));

    let engines: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let out = dispatcher
        .dispatch(&engines, &Message::prompt("ping"))
        .await
        .unwrap();

    assert_eq!(out.len(), 1);
    assert!(out.contains_key("mock:default-model"));
}
