//! Configuration for the user bootstrap
//!
//! Placeholder values come from the environment. A YAML values file named by
//! `MONGO_INIT_VALUES_FILE` can supply them instead, e.g. when the values are
//! mounted as a secret; environment variables win over file entries.

use crate::users::{render_users, required_placeholders, validate_database_name, UserSpec};
use anyhow::{bail, Context, Result};
use common::{EnvSource, Layered};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// Values file: a flat map of placeholder name to value.
///
/// ```yaml
/// DB_NAME: shopdb
/// OWNER_USER: admin_shop
/// OWNER_PWD: pw1
/// ```
pub type ValuesFile = BTreeMap<String, String>;

/// Read placeholder values from a YAML file
pub fn read_values_file(path: &Path) -> Result<ValuesFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(ValuesFile::new());
    }

    let raw: BTreeMap<String, Value> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse values file {}", path.display()))?;

    raw.into_iter()
        .map(|(name, value)| -> Result<(String, String)> {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => bail!("{} in {} must be a scalar", name, path.display()),
            };
            Ok((name, value))
        })
        .collect()
}

/// Configuration for the create-users binary
pub struct Config {
    pub mongo_uri: String,
    pub server_selection_timeout: Duration,
    /// Exit non-zero when any user could not be created.
    pub strict: bool,
    pub database: String,
    pub users: Vec<UserSpec>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let file = match env.get("MONGO_INIT_VALUES_FILE") {
            Some(path) if !path.is_empty() => read_values_file(Path::new(&path))?,
            _ => ValuesFile::new(),
        };
        let values = Layered::new(env, &file);

        let missing: Vec<&str> = required_placeholders()
            .into_iter()
            .filter(|name| values.get(name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("Missing placeholder values: {}", missing.join(", "));
        }

        let (database, users) = render_users(&values).context("Failed to render users")?;
        validate_database_name(&database).context("Invalid DB_NAME")?;

        for user in &users {
            if looks_unsubstituted(&user.username) || looks_unsubstituted(&user.password) {
                warn!(
                    user = %user.username,
                    role = %user.role,
                    "Value still looks like a placeholder"
                );
            }
        }

        Ok(Self {
            mongo_uri: env.env_or("MONGO_URI", DEFAULT_MONGO_URI),
            server_selection_timeout: Duration::from_secs(
                env.env_parse("MONGO_SERVER_SELECTION_TIMEOUT", 10),
            ),
            strict: env.env_bool("MONGO_INIT_STRICT", false),
            database,
            users,
        })
    }
}

fn looks_unsubstituted(value: &str) -> bool {
    value.len() > 4 && value.starts_with("__") && value.ends_with("__")
}
