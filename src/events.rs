//! # Lifecycle Events
//!
//! The orchestrator announces lifecycle transitions through an injected [`EventPublisher`]
//! instead of being an event emitter itself. The event *names* (see [`LifecycleEvent::name`])
//! and the points where they fire are the stable contract:
//!
//! | Event | Fired when |
//! |-------|------------|
//! | `module.registered` | a module was accepted by `register` |
//! | `module.initializing` | its factory is about to run |
//! | `module.initialized` | it started and is `Ready` |
//! | `module.error` | its factory or `start` failed |
//! | `module.stopped` | `stop` succeeded during shutdown |
//! | `module.stop_failed` | `stop` failed during shutdown |
//! | `orchestrator.ready` | every module is `Ready` |
//! | `orchestrator.error` | `initialize` aborted |
//! | `orchestrator.shutdown` | shutdown finished |

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// A lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum LifecycleEvent {
    #[serde(rename = "module.registered")]
    ModuleRegistered { name: String },
    #[serde(rename = "module.initializing")]
    ModuleInitializing { name: String },
    #[serde(rename = "module.initialized")]
    ModuleInitialized { name: String, instance: &'static str },
    #[serde(rename = "module.error")]
    ModuleError { name: String, error: String },
    #[serde(rename = "module.stopped")]
    ModuleStopped { name: String },
    #[serde(rename = "module.stop_failed")]
    ModuleStopFailed { name: String, error: String },
    #[serde(rename = "orchestrator.ready")]
    OrchestratorReady,
    #[serde(rename = "orchestrator.error")]
    OrchestratorError { error: String },
    #[serde(rename = "orchestrator.shutdown")]
    OrchestratorShutdown { failures: usize },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleRegistered { .. } => "module.registered",
            Self::ModuleInitializing { .. } => "module.initializing",
            Self::ModuleInitialized { .. } => "module.initialized",
            Self::ModuleError { .. } => "module.error",
            Self::ModuleStopped { .. } => "module.stopped",
            Self::ModuleStopFailed { .. } => "module.stop_failed",
            Self::OrchestratorReady => "orchestrator.ready",
            Self::OrchestratorError { .. } => "orchestrator.error",
            Self::OrchestratorShutdown { .. } => "orchestrator.shutdown",
        }
    }

    /// The module this event is about, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::ModuleRegistered { name }
            | Self::ModuleInitializing { name }
            | Self::ModuleInitialized { name, .. }
            | Self::ModuleError { name, .. }
            | Self::ModuleStopped { name }
            | Self::ModuleStopFailed { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Sink for lifecycle events. Publishing is fire-and-forget and must not block.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LifecycleEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: LifecycleEvent) {}
}

/// Fans events out to any number of subscribers over a tokio broadcast channel.
///
/// Events published while nobody is subscribed are dropped. Slow subscribers may observe
/// `RecvError::Lagged` once `capacity` events are buffered.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: LifecycleEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            trace!(event = name, "No subscribers");
        }
    }
}
