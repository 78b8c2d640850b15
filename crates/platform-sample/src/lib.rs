//! # Platform Sample Library
//!
//! A small marketing platform assembled with the module orchestrator. Exposed as a library
//! for integration testing.

pub mod lifecycle;
pub mod modules;
pub mod services;
