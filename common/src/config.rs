//! Configuration lookup helpers
//!
//! Values are read through an [`EnvSource`] so the same parsing rules apply to
//! the process environment, to a values file loaded into a map, and to the
//! in-memory maps used by tests.

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::str::FromStr;

/// A source of named string values.
///
/// Only [`EnvSource::get`] has to be implemented; the other methods layer the
/// usual defaults, required checks and type parsing on top of it.
pub trait EnvSource {
    /// Raw lookup. `None` when the name is not set.
    fn get(&self, name: &str) -> Option<String>;

    /// Get a value with a default.
    ///
    /// # Example
    /// ```ignore
    /// let uri = ProcessEnv.env_or("MONGO_URI", "mongodb://localhost:27017");
    /// ```
    fn env_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Get a required value, returning an error if not set.
    fn env_required(&self, name: &str) -> Result<String> {
        self.get(name).ok_or_else(|| anyhow!("{} must be set", name))
    }

    /// Get a value as a boolean.
    ///
    /// Accepts `true`/`1`/`yes` (case-insensitive) as true; any other value is
    /// false. Returns `default` when unset.
    fn env_bool(&self, name: &str, default: bool) -> bool {
        self.get(name)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(default)
    }

    /// Get a value parsed as a specific type.
    ///
    /// Returns `default` if the value is not set or fails to parse.
    fn env_parse<T: FromStr>(&self, name: &str, default: T) -> T {
        self.get(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

/// Two sources where `primary` wins and `fallback` fills the gaps.
#[derive(Debug, Clone)]
pub struct Layered<P, F> {
    pub primary: P,
    pub fallback: F,
}

impl<P, F> Layered<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: EnvSource, F: EnvSource> EnvSource for Layered<P, F> {
    fn get(&self, name: &str) -> Option<String> {
        self.primary.get(name).or_else(|| self.fallback.get(name))
    }
}
