//! # Orchestrator Errors
//!
//! Two error families live here:
//!
//! - [`OrchestratorError`]: what the orchestrator itself reports (registration,
//!   resolution, startup, lookup).
//! - [`ModuleError`]: what module code returns from factories and lifecycle hooks.
//!
//! Structural and construction errors abort `initialize()`. Shutdown and health
//! failures are never raised as errors; they are reported as data.

use crate::registry::ModuleStatus;

/// Boxed error used for wrapping arbitrary module failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur within the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    #[error("Module name must not be empty")]
    EmptyModuleName,

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module '{required_by}' depends on unknown module '{dependency}'")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },

    /// `path` starts and ends with `module`, e.g. `a -> b -> a`.
    #[error("Dependency cycle detected at '{module}': {}", .path.join(" -> "))]
    CycleDetected { module: String, path: Vec<String> },

    #[error("Module '{module}' failed to start: {source}")]
    ModuleConstruction {
        module: String,
        #[source]
        source: ModuleError,
    },

    #[error("Module '{module}' is not ready (status: {status})")]
    ModuleNotReady { module: String, status: ModuleStatus },
}

impl OrchestratorError {
    /// Name of the module this error is about, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::DuplicateModule(name) | Self::ModuleNotFound(name) => Some(name),
            Self::MissingDependency { required_by, .. } => Some(required_by),
            Self::CycleDetected { module, .. }
            | Self::ModuleConstruction { module, .. }
            | Self::ModuleNotReady { module, .. } => Some(module),
            Self::EmptyModuleName => None,
        }
    }
}

/// Errors returned by module factories and lifecycle hooks.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("{0}")]
    Message(String),

    #[error("Dependency '{0}' was not provided")]
    DependencyMissing(String),

    #[error("Dependency '{name}' is not a {expected}")]
    DependencyType { name: String, expected: &'static str },

    #[error("Shared service {0} is not available")]
    ServiceMissing(&'static str),

    #[error(transparent)]
    Other(#[from] BoxError),
}

impl From<String> for ModuleError {
    fn from(msg: String) -> Self {
        ModuleError::Message(msg)
    }
}

impl From<&str> for ModuleError {
    fn from(msg: &str) -> Self {
        ModuleError::Message(msg.to_string())
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}
