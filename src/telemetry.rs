//! # Observability & Tracing
//!
//! The orchestrator logs through the `tracing` crate with structured fields. Every log line
//! about a module carries `module = <name>`, so one module's lifecycle can be followed through
//! the logs.
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter driven by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Registration**: accepted and rejected modules (`debug` / `warn`)
//! - **Startup**: resolved order (`debug`), each module ready (`info`), the failing module (`error`)
//! - **Shutdown**: each module stopped (`info`), stop failures (`warn`)
//! - **Health**: unhealthy modules (`warn`), the folded result (`debug`)
//!
//! `initialize`, `shutdown` and `perform_health_check` each open a span, so module logs nest
//! under the phase that produced them.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p platform-sample
//! RUST_LOG=module_orchestrator=debug cargo run -p platform-sample
//! ```
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO initialize: Initializing modules
//! INFO initialize: Module ready module=auth instance="AuthModule"
//! INFO initialize: Module ready module=notifications instance="NotificationsModule"
//! INFO initialize: Orchestrator ready modules=4
//! INFO shutdown: Module stopped module=campaigns
//! INFO shutdown: Shutdown complete stopped=4 failures=0
//! ```

/// Initializes the global subscriber. Call once from the entry point.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // module names are carried as fields
        .compact()
        .init();
}
