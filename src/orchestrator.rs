//! # Lifecycle Coordinator
//!
//! [`Orchestrator`] owns the registry and drives every module through its lifecycle:
//!
//! 1. **Register** modules in any order ([`Orchestrator::register`]).
//! 2. **Initialize**: resolve the dependency order, then construct and start each module
//!    strictly sequentially. Startup is **fail-fast**: the first factory or `start` failure
//!    marks that module `Error` and aborts the whole call, so later modules are never built.
//! 3. **Use**: fetch started modules with [`Orchestrator::get_module`], probe them with
//!    [`Orchestrator::perform_health_check`].
//! 4. **Shutdown**: stop modules in reverse dependency order. Shutdown is **best-effort**:
//!    every module gets a stop attempt and failures are collected into a [`ShutdownReport`].
//!
//! `initialize` and `shutdown` take `&mut self`, so they can never overlap with each other
//! or with themselves.
//!
//! ```rust
//! use module_orchestrator::{factory_fn, Module, ModuleError, NoopPublisher, Orchestrator, OrchestratorConfig, SharedContext};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Store;
//! #[async_trait]
//! impl Module for Store {}
//!
//! struct Auth { store: Arc<Store> }
//! #[async_trait]
//! impl Module for Auth {}
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut orchestrator = Orchestrator::new(
//!         OrchestratorConfig::default(),
//!         SharedContext::default(),
//!         Arc::new(NoopPublisher),
//!     );
//!
//!     // Dependents may be registered before their dependencies
//!     orchestrator
//!         .register("auth", ["store"], factory_fn(|deps, _ctx| async move {
//!             let store = deps.get_as::<Store>("store")?;
//!             Ok::<_, ModuleError>(Auth { store })
//!         }))
//!         .unwrap();
//!     orchestrator
//!         .register("store", Vec::<String>::new(), factory_fn(|_, _| async { Ok(Store) }))
//!         .unwrap();
//!
//!     orchestrator.initialize().await.unwrap();
//!     assert!(orchestrator.get_module_as::<Auth>("auth").is_ok());
//!
//!     let report = orchestrator.shutdown().await;
//!     assert!(report.is_clean());
//! }
//! ```

use crate::config::OrchestratorConfig;
use crate::context::SharedContext;
use crate::error::{ModuleError, OrchestratorError};
use crate::events::{EventPublisher, LifecycleEvent};
use crate::health::{self, HealthReport};
use crate::module::{BoxFuture, DependencyBundle, Module, ModuleFactory, ModuleInstance};
use crate::registry::{ModuleDescriptor, ModuleRegistration, ModuleRegistry, ModuleStatus};
use crate::resolver::resolve_order;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Point-in-time view of one module, as returned by [`Orchestrator::module_status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleStatusSnapshot {
    pub status: ModuleStatus,
    pub dependencies: Vec<String>,
    pub has_instance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Outcome of [`Orchestrator::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShutdownReport {
    /// Modules whose `stop` succeeded, in the order they were stopped.
    pub stopped: Vec<String>,
    /// Modules whose `stop` failed, with the error message.
    pub failures: Vec<(String, String)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registers modules, starts them in dependency order and tears them down in reverse.
pub struct Orchestrator {
    registry: ModuleRegistry,
    context: SharedContext,
    events: Arc<dyn EventPublisher>,
    config: OrchestratorConfig,
    initialized: bool,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, context: SharedContext, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            context,
            events,
            config,
            initialized: false,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a module. Dependencies may name modules that are registered later.
    pub fn register<I, S>(
        &mut self,
        name: impl Into<String>,
        dependencies: I,
        factory: ModuleFactory,
    ) -> Result<(), OrchestratorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register_module(ModuleRegistration::new(name, factory).depends_on(dependencies))
    }

    pub fn register_module(&mut self, registration: ModuleRegistration) -> Result<(), OrchestratorError> {
        let name = registration.name().to_string();
        if self.initialized {
            warn!(module = %name, "Registering after initialization; module will start on next initialize");
        }
        if let Err(e) = self.registry.register(registration) {
            warn!(module = %name, error = %e, "Registration rejected");
            return Err(e);
        }
        debug!(module = %name, size = self.registry.len(), "Registered");
        self.events.publish(LifecycleEvent::ModuleRegistered { name });
        Ok(())
    }

    /// Registers each module in turn, stopping at the first rejection.
    ///
    /// Modules registered before the rejection stay registered.
    pub fn register_all(
        &mut self,
        registrations: impl IntoIterator<Item = ModuleRegistration>,
    ) -> Result<(), OrchestratorError> {
        for registration in registrations {
            self.register_module(registration)?;
        }
        Ok(())
    }

    // =========================================================================
    // Startup (fail-fast)
    // =========================================================================

    /// Constructs and starts every module in dependency order.
    ///
    /// Returns immediately if already initialized. On failure the orchestrator stays
    /// un-initialized; modules that reached `Ready` keep running and are stopped by
    /// [`Orchestrator::shutdown`].
    #[instrument(skip(self), fields(modules = self.registry.len()))]
    pub async fn initialize(&mut self) -> Result<(), OrchestratorError> {
        if self.initialized {
            debug!("Already initialized");
            return Ok(());
        }

        info!("Initializing modules");
        if let Err(e) = self.start_all().await {
            error!(error = %e, "Initialization failed");
            self.events.publish(LifecycleEvent::OrchestratorError { error: e.to_string() });
            return Err(e);
        }

        self.initialized = true;
        info!(modules = self.registry.len(), "Orchestrator ready");
        self.events.publish(LifecycleEvent::OrchestratorReady);
        Ok(())
    }

    async fn start_all(&mut self) -> Result<(), OrchestratorError> {
        let order = resolve_order(&self.registry)?;

        // A new run: modules that failed in an earlier run get another attempt, and so do
        // modules left `Initializing` by a run that was cancelled mid-start.
        for descriptor in self.registry.descriptors_mut() {
            if matches!(descriptor.status, ModuleStatus::Error | ModuleStatus::Initializing) {
                descriptor.status = ModuleStatus::Registered;
            }
        }

        for name in &order {
            self.ensure_ready(name).await?;
        }
        Ok(())
    }

    /// Starts `name` after making sure all of its dependencies are `Ready`.
    ///
    /// Dependencies normally precede their dependents in the resolved order; the recursive
    /// check keeps this correct when a module is reached through several paths.
    fn ensure_ready<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        Box::pin(async move {
            let descriptor = self.registry.lookup(name)?;
            match descriptor.status {
                ModuleStatus::Ready => return Ok(()),
                // Only reachable through a cycle the resolver did not see
                ModuleStatus::Initializing => {
                    return Err(OrchestratorError::CycleDetected {
                        module: name.to_string(),
                        path: vec![name.to_string()],
                    })
                }
                ModuleStatus::Registered | ModuleStatus::Error => {}
            }

            let dependencies = descriptor.dependencies.clone();
            for dep in &dependencies {
                if !self.registry.contains(dep) {
                    return Err(OrchestratorError::MissingDependency {
                        dependency: dep.clone(),
                        required_by: name.to_string(),
                    });
                }
                self.ensure_ready(dep).await?;
            }

            self.start_module(name, &dependencies).await
        })
    }

    async fn start_module(&mut self, name: &str, dependencies: &[String]) -> Result<(), OrchestratorError> {
        let mut instances = HashMap::with_capacity(dependencies.len());
        for dep in dependencies {
            let dependency = self.registry.lookup(dep)?;
            let instance = dependency
                .instance
                .clone()
                .ok_or_else(|| OrchestratorError::ModuleNotReady {
                    module: dep.clone(),
                    status: dependency.status,
                })?;
            instances.insert(dep.clone(), instance);
        }

        let descriptor = self.registry.lookup_mut(name)?;
        descriptor.status = ModuleStatus::Initializing;
        descriptor.last_error = None;
        let bundle = DependencyBundle::new(instances, descriptor.config.clone());
        let construct = (descriptor.factory)(bundle, self.context.clone());

        debug!(module = %name, deps = dependencies.len(), "Constructing");
        self.events.publish(LifecycleEvent::ModuleInitializing { name: name.to_string() });

        let result = async {
            let instance = construct.await?;
            instance.module().start().await?;
            Ok::<_, ModuleError>(instance)
        }
        .await;

        let descriptor = self.registry.lookup_mut(name)?;
        match result {
            Ok(instance) => {
                let type_name = instance.type_name();
                descriptor.instance = Some(instance);
                descriptor.status = ModuleStatus::Ready;
                info!(module = %name, instance = type_name, "Module ready");
                self.events.publish(LifecycleEvent::ModuleInitialized {
                    name: name.to_string(),
                    instance: type_name,
                });
                Ok(())
            }
            Err(e) => {
                descriptor.status = ModuleStatus::Error;
                descriptor.last_error = Some(e.to_string());
                error!(module = %name, error = %e, "Module failed to start");
                self.events.publish(LifecycleEvent::ModuleError {
                    name: name.to_string(),
                    error: e.to_string(),
                });
                Err(OrchestratorError::ModuleConstruction {
                    module: name.to_string(),
                    source: e,
                })
            }
        }
    }

    // =========================================================================
    // Shutdown (best-effort)
    // =========================================================================

    /// Stops every started module, dependents first. Never fails.
    ///
    /// Stopped modules release their instance and return to `Registered`, so the orchestrator
    /// can be initialized again.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) -> ShutdownReport {
        info!("Shutting down modules");

        let order = match resolve_order(&self.registry) {
            Ok(order) => order,
            Err(e) => {
                // Only possible after late registrations; dependents were registered later
                // than what they depend on in every graph that ever initialized.
                warn!(error = %e, "Dependency order unavailable, stopping in reverse registration order");
                self.registry.all().map(str::to_string).collect()
            }
        };

        let mut report = ShutdownReport::default();
        for name in order.iter().rev() {
            let Ok(descriptor) = self.registry.lookup_mut(name) else {
                continue;
            };
            let Some(instance) = descriptor.instance.take() else {
                continue;
            };
            descriptor.status = ModuleStatus::Registered;

            match instance.module().stop().await {
                Ok(()) => {
                    info!(module = %name, "Module stopped");
                    self.events.publish(LifecycleEvent::ModuleStopped { name: name.clone() });
                    report.stopped.push(name.clone());
                }
                Err(e) => {
                    warn!(module = %name, error = %e, "Module failed to stop");
                    self.events.publish(LifecycleEvent::ModuleStopFailed {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                    report.failures.push((name.clone(), e.to_string()));
                }
            }
        }

        // Failed or cancelled modules never got an instance
        for descriptor in self.registry.descriptors_mut() {
            if descriptor.instance.is_none() {
                descriptor.status = ModuleStatus::Registered;
            }
        }

        self.initialized = false;
        info!(
            stopped = report.stopped.len(),
            failures = report.failures.len(),
            "Shutdown complete"
        );
        self.events.publish(LifecycleEvent::OrchestratorShutdown {
            failures: report.failures.len(),
        });
        report
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the live instance of a `Ready` module.
    pub fn get_module(&self, name: &str) -> Result<ModuleInstance, OrchestratorError> {
        let descriptor = self.registry.lookup(name)?;
        match (&descriptor.instance, descriptor.status) {
            (Some(instance), ModuleStatus::Ready) => Ok(instance.clone()),
            (_, status) => Err(OrchestratorError::ModuleNotReady {
                module: name.to_string(),
                status,
            }),
        }
    }

    /// Like [`Orchestrator::get_module`], downcast to the concrete module type.
    ///
    /// A type mismatch is reported as `ModuleNotReady` since no module of that type is available.
    pub fn get_module_as<M: Module>(&self, name: &str) -> Result<Arc<M>, OrchestratorError> {
        let instance = self.get_module(name)?;
        instance.downcast::<M>().ok_or_else(|| OrchestratorError::ModuleNotReady {
            module: name.to_string(),
            status: ModuleStatus::Ready,
        })
    }

    pub fn module_status(&self) -> BTreeMap<String, ModuleStatusSnapshot> {
        self.registry
            .descriptors()
            .map(|descriptor| (descriptor.name.clone(), snapshot(descriptor)))
            .collect()
    }

    /// Probes every `Ready` module. Never fails; unhealthy modules degrade the report.
    #[instrument(skip(self))]
    pub async fn perform_health_check(&self) -> HealthReport {
        let ready: Vec<(String, ModuleInstance)> = self
            .registry
            .descriptors()
            .filter(|descriptor| descriptor.status == ModuleStatus::Ready)
            .filter_map(|descriptor| {
                descriptor
                    .instance
                    .clone()
                    .map(|instance| (descriptor.name.clone(), instance))
            })
            .collect();

        health::aggregate(ready, self.config.health_check_timeout()).await
    }
}

fn snapshot(descriptor: &ModuleDescriptor) -> ModuleStatusSnapshot {
    ModuleStatusSnapshot {
        status: descriptor.status,
        dependencies: descriptor.dependencies.clone(),
        has_instance: descriptor.instance.is_some(),
        last_error: descriptor.last_error.clone(),
    }
}
