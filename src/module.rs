//! # Module Contract
//!
//! The [`Module`] trait is the capability set every orchestrated subsystem implements:
//! `start`, `stop` and `health_check`. All three are **provided methods**, so a module only
//! overrides the hooks it actually needs:
//!
//! - A missing `start` / `stop` is a no-op success.
//! - A module that does not override [`Module::reports_health`] is considered healthy
//!   whenever it is `Ready`, and its `health_check` is never called.
//!
//! Modules are produced by a factory closure that receives a [`DependencyBundle`] (the
//! already-started instances of its declared dependencies plus its own configuration) and the
//! process-wide [`SharedContext`](crate::context::SharedContext).
//!
//! ```rust
//! use module_orchestrator::{Module, ModuleError};
//! use async_trait::async_trait;
//!
//! struct Cache;
//!
//! #[async_trait]
//! impl Module for Cache {
//!     async fn start(&self) -> Result<(), ModuleError> {
//!         Ok(())
//!     }
//! }
//! ```

use crate::context::SharedContext;
use crate::error::ModuleError;
use async_trait::async_trait;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Health as reported by a single module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a module's own health check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub details: serde_json::Value,
}

impl HealthSnapshot {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            details: serde_json::Value::Null,
        }
    }

    pub fn unhealthy(details: impl Into<serde_json::Value>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            details: details.into(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Lifecycle contract for an orchestrated module.
///
/// # Async & Sharing
/// Hooks take `&self` because a started module is shared: dependents hold it in their
/// [`DependencyBundle`], and health probes run on separate tasks. Modules that need mutable
/// state keep it behind their own lock.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Called once, right after the factory returns, before the module is marked `Ready`.
    async fn start(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Called once during shutdown, after every dependent has been stopped.
    async fn stop(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Whether this module implements [`Module::health_check`].
    ///
    /// Override both together. While this returns `false` the probe is never called and the
    /// module counts as healthy for as long as it is `Ready`.
    fn reports_health(&self) -> bool {
        false
    }

    /// Only called when [`Module::reports_health`] returns `true`.
    async fn health_check(&self) -> Result<HealthSnapshot, ModuleError> {
        Ok(HealthSnapshot::healthy())
    }
}

/// A started module, shared between the orchestrator and its dependents.
///
/// Holds the same allocation twice: once as `dyn Module` for lifecycle calls and once as
/// `dyn Any` so callers can recover the concrete type.
#[derive(Clone)]
pub struct ModuleInstance {
    module: Arc<dyn Module>,
    any: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ModuleInstance {
    pub fn new<M: Module>(module: M) -> Self {
        Self::from_arc(Arc::new(module))
    }

    pub fn from_arc<M: Module>(module: Arc<M>) -> Self {
        let any: Arc<dyn Any + Send + Sync> = module.clone();
        let type_name = short_type_name(std::any::type_name::<M>());
        Self {
            module,
            any,
            type_name,
        }
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recovers the concrete module type.
    pub fn downcast<M: Module>(&self) -> Option<Arc<M>> {
        self.any.clone().downcast::<M>().ok()
    }
}

/// Strips the module path from a type name, leaving generic arguments untouched
/// (`a::Wrapper<b::Store>` becomes `Wrapper<b::Store>`).
fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    let start = full[..head_end].rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Everything a factory receives about its own module: dependency instances and config.
#[derive(Debug, Clone, Default)]
pub struct DependencyBundle {
    instances: HashMap<String, ModuleInstance>,
    config: serde_json::Value,
}

impl DependencyBundle {
    pub(crate) fn new(instances: HashMap<String, ModuleInstance>, config: serde_json::Value) -> Self {
        Self { instances, config }
    }

    pub fn get(&self, name: &str) -> Option<&ModuleInstance> {
        self.instances.get(name)
    }

    /// Fetches a dependency as its concrete type.
    pub fn get_as<M: Module>(&self, name: &str) -> Result<Arc<M>, ModuleError> {
        let instance = self
            .instances
            .get(name)
            .ok_or_else(|| ModuleError::DependencyMissing(name.to_string()))?;
        instance.downcast::<M>().ok_or_else(|| ModuleError::DependencyType {
            name: name.to_string(),
            expected: std::any::type_name::<M>(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The module's own configuration (`Null` when none was registered).
    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }
}

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased module constructor stored on each descriptor.
pub type ModuleFactory = Box<
    dyn Fn(DependencyBundle, SharedContext) -> BoxFuture<'static, Result<ModuleInstance, ModuleError>>
        + Send
        + Sync,
>;

/// Erases an async constructor closure into a [`ModuleFactory`].
pub fn factory_fn<F, Fut, M>(factory: F) -> ModuleFactory
where
    F: Fn(DependencyBundle, SharedContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<M, ModuleError>> + Send + 'static,
    M: Module,
{
    Box::new(move |deps, ctx| {
        let fut = factory(deps, ctx);
        Box::pin(async move { fut.await.map(ModuleInstance::new) })
    })
}
