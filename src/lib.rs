//! # Module Orchestrator
//!
//! > **Start subsystems in dependency order, stop them in reverse.**
//!
//! This crate registers named subsystems ("modules") and computes a safe startup order from
//! their declared dependencies. It constructs and starts them in that order, aggregates their
//! health, and tears them down in reverse on shutdown.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Fail-fast up, best-effort down
//!
//! - **Startup is fail-fast**: a platform with a broken dependency should not come up
//!   partially. The first failing factory or `start` aborts `initialize()`, and nothing after
//!   it is constructed.
//! - **Shutdown is best-effort**: a broken platform should still release as much as it can.
//!   Every started module gets a `stop` call, and failures are collected, never raised.
//!
//! ### Explicit wiring, no globals
//!
//! Shared services (persistence, cache, event bus) go into a [`SharedContext`] built once by
//! the entry point and handed to every factory. Lifecycle events go to an injected
//! [`EventPublisher`]; the orchestrator is not an emitter itself.
//!
//! ## 🚀 Core Concepts
//!
//! ### The capability set: [`Module`]
//! `start`, `stop` and `health_check` are all provided methods. Implement only what your
//! module needs; a missing hook is a no-op, and a module that does not report health is healthy
//! while `Ready`.
//!
//! ### Factories and dependency injection
//! A factory receives a [`DependencyBundle`] with the already-started instances of the
//! module's dependencies, plus the shared context:
//!
//! ```rust,ignore
//! orchestrator.register("campaigns", ["store", "auth"], factory_fn(|deps, ctx| async move {
//!     let auth = deps.get_as::<AuthModule>("auth")?;
//!     let store = ctx.require::<MemoryStore>()?;
//!     Ok::<_, ModuleError>(CampaignModule::new(auth, store))
//! }))?;
//! ```
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Catalog ([`registry`])
//! - **Role**: name → descriptor (dependencies, config, status, instance). No validation of
//!   dependency names, so registration order is free.
//!
//! ### 2. The Planner ([`resolver`])
//! - **Role**: depth-first topological sort. Reports the full path of a cycle and the
//!   requester of a missing dependency.
//!
//! ### 3. The Conductor ([`orchestrator`])
//! - **Role**: drives `Registered → Initializing → Ready | Error`, publishes
//!   [`LifecycleEvent`]s, and stops modules in reverse order.
//! - **Key items**: [`Orchestrator`], [`ShutdownReport`].
//!
//! ### 4. The Doctor ([`health`])
//! - **Role**: concurrent, timeout-bounded probes folded into a [`HealthReport`].
//!
//! ### 5. Test doubles ([`mock`])
//! - [`mock::TestModule`] and [`mock::RecordingPublisher`] for scripting lifecycles in tests.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the sample platform with info logs
//! RUST_LOG=info cargo run -p platform-sample
//!
//! # Run all tests
//! cargo test --workspace
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod health;
pub mod mock;
pub mod module;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod telemetry;

pub use config::OrchestratorConfig;
pub use context::{SharedContext, SharedContextBuilder};
pub use error::{BoxError, ConfigError, ModuleError, OrchestratorError};
pub use events::{BroadcastPublisher, EventPublisher, LifecycleEvent, NoopPublisher};
pub use health::{HealthReport, ModuleHealth, OverallHealth};
pub use module::{factory_fn, DependencyBundle, HealthSnapshot, HealthStatus, Module, ModuleFactory, ModuleInstance};
pub use orchestrator::{ModuleStatusSnapshot, Orchestrator, ShutdownReport};
pub use registry::{ModuleDescriptor, ModuleRegistration, ModuleRegistry, ModuleStatus};
pub use resolver::resolve_order;
