//! # Platform Lifecycle
//!
//! Wires the business modules into an [`Orchestrator`](module_orchestrator::Orchestrator)
//! and exposes typed access to them once started.
//!
//! ## The Platform Pattern
//!
//! ```rust,ignore
//! let mut platform = Platform::new(OrchestratorConfig::default(), shared_context(64), events)?;
//! platform.start().await?;
//!
//! let token = platform.auth()?.login("u1").await?;
//! let campaign = platform.campaigns()?.create_campaign(&token, "Launch", 500.0).await?;
//!
//! let report = platform.shutdown().await;
//! ```
//!
//! Registration order does not matter: the orchestrator resolves `auth` first, then
//! `profiles` and `notifications`, then `campaigns`, and stops them in reverse.
//!
//! ## Module configuration
//!
//! [`PlatformSettings`] is split into per-module JSON documents at registration time. Each
//! factory reads its own slice through `DependencyBundle::config`.

pub mod platform;

pub use platform::*;
