//! # Module Registry
//!
//! In-memory catalog of [`ModuleDescriptor`]s. The registry only stores and looks things up:
//! dependency names are **not** validated here, so modules can be registered in any order.
//! Validation happens when the [`resolver`](crate::resolver) computes the startup order.

use crate::error::OrchestratorError;
use crate::module::{ModuleFactory, ModuleInstance};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Per-module lifecycle state.
///
/// `Registered → Initializing → Ready` on success, `Registered → Initializing → Error` on
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Registered,
    Initializing,
    Ready,
    Error,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleStatus::Registered => "registered",
            ModuleStatus::Initializing => "initializing",
            ModuleStatus::Ready => "ready",
            ModuleStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Everything the orchestrator knows about one module.
pub struct ModuleDescriptor {
    pub(crate) name: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) config: serde_json::Value,
    pub(crate) factory: ModuleFactory,
    pub(crate) status: ModuleStatus,
    pub(crate) instance: Option<ModuleInstance>,
    pub(crate) last_error: Option<String>,
}

impl ModuleDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependencies, deduplicated, in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }

    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    pub fn instance(&self) -> Option<&ModuleInstance> {
        self.instance.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("status", &self.status)
            .field("has_instance", &self.instance.is_some())
            .finish()
    }
}

/// A module waiting to be registered: name, dependencies, config and factory.
pub struct ModuleRegistration {
    name: String,
    dependencies: Vec<String>,
    config: serde_json::Value,
    factory: ModuleFactory,
}

impl ModuleRegistration {
    pub fn new(name: impl Into<String>, factory: ModuleFactory) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            config: serde_json::Value::Null,
            factory,
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Insertion-ordered map of module name to descriptor.
#[derive(Default)]
pub struct ModuleRegistry {
    descriptors: HashMap<String, ModuleDescriptor>,
    order: Vec<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new descriptor with status `Registered`.
    ///
    /// A duplicate name is rejected and the existing descriptor is left untouched.
    pub fn register(&mut self, registration: ModuleRegistration) -> Result<(), OrchestratorError> {
        let ModuleRegistration {
            name,
            dependencies,
            config,
            factory,
        } = registration;

        if name.is_empty() {
            return Err(OrchestratorError::EmptyModuleName);
        }
        if self.descriptors.contains_key(&name) {
            return Err(OrchestratorError::DuplicateModule(name));
        }

        let mut unique = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }

        self.order.push(name.clone());
        self.descriptors.insert(
            name.clone(),
            ModuleDescriptor {
                name,
                dependencies: unique,
                config,
                factory,
                status: ModuleStatus::Registered,
                instance: None,
                last_error: None,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ModuleDescriptor, OrchestratorError> {
        self.descriptors
            .get(name)
            .ok_or_else(|| OrchestratorError::ModuleNotFound(name.to_string()))
    }

    pub(crate) fn lookup_mut(&mut self, name: &str) -> Result<&mut ModuleDescriptor, OrchestratorError> {
        self.descriptors
            .get_mut(name)
            .ok_or_else(|| OrchestratorError::ModuleNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// All registered names in insertion order. The iterator is lazy and can be cloned to
    /// restart.
    pub fn all(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Descriptors in insertion order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ModuleDescriptor> + '_ {
        self.order.iter().filter_map(|name| self.descriptors.get(name))
    }

    pub(crate) fn descriptors_mut(&mut self) -> impl Iterator<Item = &mut ModuleDescriptor> + '_ {
        self.descriptors.values_mut()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
