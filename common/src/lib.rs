//! Shared utilities for mongo-init components
//!
//! This crate provides common functionality used by the bootstrap binaries:
//! - Structured logging initialization
//! - Configuration lookup over the environment or in-memory sources

pub mod config;
pub mod logging;

pub use config::{EnvSource, Layered, ProcessEnv};
pub use logging::{init_logging, LogFormat, LogGuard};
