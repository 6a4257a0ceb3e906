//! User bootstrap components
//!
//! This module provides functionality for the create-users binary:
//! - Reading placeholder values from the environment or a values file
//! - Running the idempotent user creation against a database handle

mod config;
mod runner;

pub use config::{read_values_file, Config, ValuesFile, DEFAULT_MONGO_URI};
pub use runner::{bootstrap, run, BootstrapError, Outcome, Report};
