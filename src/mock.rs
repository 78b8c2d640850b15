//! # Test Doubles
//!
//! Utilities for testing code built on the orchestrator without writing a module type for
//! every scenario.
//!
//! - [`TestModule`]: a configurable module that records every lifecycle call into a shared
//!   [`CallLog`] and can be told to fail `start`, fail `stop`, report unhealthy, or hang in
//!   its health check.
//! - [`RecordingPublisher`]: an [`EventPublisher`] that keeps every event for assertions.
//!
//! ```rust
//! use module_orchestrator::mock::{CallLog, RecordingPublisher, TestModule};
//! use module_orchestrator::{Orchestrator, OrchestratorConfig, SharedContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = CallLog::default();
//!     let events = Arc::new(RecordingPublisher::default());
//!     let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), SharedContext::default(), events.clone());
//!
//!     orchestrator.register_module(TestModule::new("a", &log).registration()).unwrap();
//!     orchestrator.register_module(TestModule::new("b", &log).fail_stop().registration().depends_on(["a"])).unwrap();
//!
//!     orchestrator.initialize().await.unwrap();
//!     let report = orchestrator.shutdown().await;
//!
//!     assert_eq!(log.calls(), ["construct:a", "start:a", "construct:b", "start:b", "stop:b", "stop:a"]);
//!     assert_eq!(report.failures.len(), 1);
//!     assert!(events.names().contains(&"orchestrator.ready"));
//! }
//! ```

use crate::error::ModuleError;
use crate::events::{EventPublisher, LifecycleEvent};
use crate::module::{factory_fn, HealthSnapshot, Module, ModuleFactory};
use crate::registry::ModuleRegistration;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared, ordered record of lifecycle calls (`"construct:a"`, `"start:a"`, `"stop:a"`, ...).
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        lock(&self.calls).push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Calls with the given prefix, with the prefix stripped (`"stop"` → `["c", "b", "a"]`).
    pub fn calls_of(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{}:", kind);
        lock(&self.calls)
            .iter()
            .filter_map(|call| call.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, call: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == call).count()
    }
}

/// A scripted module. Cloning shares the same script and log.
#[derive(Debug, Clone)]
pub struct TestModule {
    name: String,
    log: CallLog,
    fail_construct: bool,
    fail_start: bool,
    fail_stop: bool,
    health: Option<ScriptedHealth>,
}

#[derive(Debug, Clone)]
enum ScriptedHealth {
    Healthy,
    Unhealthy,
    Error,
    Hang,
}

impl TestModule {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            fail_construct: false,
            fail_start: false,
            fail_stop: false,
            health: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The factory returns an error instead of a module.
    pub fn fail_construct(mut self) -> Self {
        self.fail_construct = true;
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn fail_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn healthy(mut self) -> Self {
        self.health = Some(ScriptedHealth::Healthy);
        self
    }

    /// `health_check` returns `Ok` with an unhealthy snapshot.
    pub fn unhealthy(mut self) -> Self {
        self.health = Some(ScriptedHealth::Unhealthy);
        self
    }

    /// `health_check` returns `Err`.
    pub fn failing_health(mut self) -> Self {
        self.health = Some(ScriptedHealth::Error);
        self
    }

    /// `health_check` never completes.
    pub fn hang_health(mut self) -> Self {
        self.health = Some(ScriptedHealth::Hang);
        self
    }

    /// A factory that records `construct:<name>` and yields a clone of this module.
    pub fn factory(&self) -> ModuleFactory {
        let script = self.clone();
        factory_fn(move |_deps, _ctx| {
            let script = script.clone();
            async move {
                script.log.record(format!("construct:{}", script.name));
                if script.fail_construct {
                    return Err(ModuleError::from(format!("{} factory failed", script.name)));
                }
                Ok(script)
            }
        })
    }

    pub fn registration(&self) -> ModuleRegistration {
        ModuleRegistration::new(self.name.clone(), self.factory())
    }
}

#[async_trait]
impl Module for TestModule {
    async fn start(&self) -> Result<(), ModuleError> {
        self.log.record(format!("start:{}", self.name));
        if self.fail_start {
            return Err(format!("{} failed to start", self.name).into());
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ModuleError> {
        self.log.record(format!("stop:{}", self.name));
        if self.fail_stop {
            return Err(format!("{} failed to stop", self.name).into());
        }
        Ok(())
    }

    fn reports_health(&self) -> bool {
        self.health.is_some()
    }

    async fn health_check(&self) -> Result<HealthSnapshot, ModuleError> {
        self.log.record(format!("health:{}", self.name));
        match self.health {
            Some(ScriptedHealth::Unhealthy) => Ok(HealthSnapshot::unhealthy(serde_json::json!({ "module": self.name }))),
            Some(ScriptedHealth::Error) => Err(format!("{} health probe failed", self.name).into()),
            Some(ScriptedHealth::Hang) => std::future::pending().await,
            Some(ScriptedHealth::Healthy) | None => Ok(HealthSnapshot::healthy()),
        }
    }
}

/// Keeps every published event in order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        lock(&self.events).clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(LifecycleEvent::name).collect()
    }

    /// Events of one kind, e.g. every `module.initialized`.
    pub fn named(&self, name: &str) -> Vec<LifecycleEvent> {
        lock(&self.events)
            .iter()
            .filter(|event| event.name() == name)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: LifecycleEvent) {
        lock(&self.events).push(event);
    }
}

// Poisoned locks still hand out their data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
