//! Shared helpers for router integration tests
//!
//! Builds routers over scripted in-process adapters and a manual clock so
//! tests never touch the network or wait on wall-clock time.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use switchyard::clock::ManualClock;
use switchyard::config::Config;
use switchyard::error::ProviderError;
use switchyard::generation::{GenerationRequest, GenerationResponse, TaskCategory};
use switchyard::metrics::Metrics;
use switchyard::providers::Adapter;
use switchyard::registry::ProviderRegistry;
use switchyard::router::Router;

/// What a scripted adapter does on one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    RateLimited,
    Transport,
    Auth,
    /// Never completes; only cancellation gets the router out
    Hang,
}

/// Provider names in the order adapters were called
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub struct ScriptedAdapter {
    name: String,
    script: Mutex<VecDeque<Behavior>>,
    then: Behavior,
    log: CallLog,
}

#[async_trait]
impl Adapter for ScriptedAdapter {
    async fn call(
        &self,
        model: &str,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        self.log.lock().unwrap().push(self.name.clone());
        let behavior = self.script.lock().unwrap().pop_front().unwrap_or(self.then);

        match behavior {
            Behavior::Succeed => Ok(GenerationResponse {
                text: format!("{} says hi", self.name),
                provider_name: self.name.clone(),
                model_used: model.to_string(),
                tokens_used: Some(7),
            }),
            Behavior::RateLimited => Err(ProviderError::from_status(
                &self.name,
                429,
                "Too Many Requests",
            )),
            Behavior::Transport => Err(ProviderError::from_status(
                &self.name,
                500,
                "upstream exploded; secret=sk-live-123",
            )),
            Behavior::Auth => Err(ProviderError::from_status(&self.name, 401, "invalid x-api-key")),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// One provider in a test setup
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    name: String,
    rpm: u32,
    priority: u32,
    script: Vec<Behavior>,
    then: Behavior,
}

pub fn provider(name: &str, rpm: u32) -> ProviderSpec {
    ProviderSpec {
        name: name.to_string(),
        rpm,
        priority: 1,
        script: Vec::new(),
        then: Behavior::Succeed,
    }
}

impl ProviderSpec {
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Behavior for every call not covered by `script`
    pub fn always(mut self, behavior: Behavior) -> Self {
        self.then = behavior;
        self
    }

    /// Behaviors for the first calls, in order
    pub fn script(mut self, script: &[Behavior]) -> Self {
        self.script = script.to_vec();
        self
    }
}

pub fn config_toml(specs: &[ProviderSpec]) -> String {
    let mut toml = String::from("[server]\nhost = \"127.0.0.1\"\nport = 3000\n");
    for spec in specs {
        toml.push_str(&format!(
            r#"
[[providers]]
name = "{name}"
kind = "openai"
api_key_env = "{env}"
requests_per_minute = {rpm}
priority = {priority}
logic_model = "{name}-logic"
content_model = "{name}-content"
"#,
            name = spec.name,
            env = format!("{}_API_KEY", spec.name.to_uppercase()),
            rpm = spec.rpm,
            priority = spec.priority,
        ));
    }
    toml
}

pub fn config(specs: &[ProviderSpec]) -> Config {
    let config: Config = toml::from_str(&config_toml(specs)).expect("should parse test config");
    config.validate().expect("test config should validate");
    config
}

pub struct Harness {
    pub router: Arc<Router>,
    pub clock: Arc<ManualClock>,
    pub metrics: Arc<Metrics>,
    pub log: CallLog,
}

impl Harness {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|n| *n == name).count()
    }
}

/// Router over scripted adapters; every provider has a credential
pub fn harness(specs: &[ProviderSpec]) -> Harness {
    let config = config(specs);
    let registry = ProviderRegistry::from_config_with_env(&config, |_| Some("test-key".to_string()));
    harness_with_registry(&registry, specs)
}

pub fn harness_with_registry(registry: &ProviderRegistry, specs: &[ProviderSpec]) -> Harness {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let adapters: HashMap<String, Arc<dyn Adapter>> = specs
        .iter()
        .map(|spec| {
            let adapter: Arc<dyn Adapter> = Arc::new(ScriptedAdapter {
                name: spec.name.clone(),
                script: Mutex::new(spec.script.iter().copied().collect()),
                then: spec.then,
                log: log.clone(),
            });
            (spec.name.clone(), adapter)
        })
        .collect();

    let clock = Arc::new(ManualClock::new());
    let metrics = Arc::new(Metrics::new().expect("metrics should build"));
    let router = Router::with_adapters(registry, adapters, clock.clone(), metrics.clone())
        .expect("router should build");

    Harness {
        router: Arc::new(router),
        clock,
        metrics,
        log,
    }
}

pub fn prompt() -> GenerationRequest {
    GenerationRequest::from_prompt("Summarize the weather", TaskCategory::Content)
}
