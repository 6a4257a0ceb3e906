//! `__NAME__` placeholder substitution
//!
//! A placeholder is two underscores, a name made of `A-Z`, `0-9` and `_`
//! that neither starts nor ends with `_`, and two closing underscores.
//! Anything else is copied through untouched.

use common::EnvSource;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("no value for placeholder __{0}__")]
    Missing(String),
}

/// Replace every placeholder in `template` with its value from `values`.
///
/// Values are inserted verbatim and never expanded again.
pub fn substitute(template: &str, values: &impl EnvSource) -> Result<String, PlaceholderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("__") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match token_name(after_open) {
            Some(name) => {
                let value = values
                    .get(name)
                    .ok_or_else(|| PlaceholderError::Missing(name.to_string()))?;
                out.push_str(&value);
                rest = &after_open[name.len() + 2..];
            }
            None => {
                out.push('_');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Names of all placeholders in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("__") {
        let after_open = &rest[start + 2..];
        match token_name(after_open) {
            Some(name) => {
                names.push(name);
                rest = &after_open[name.len() + 2..];
            }
            None => rest = &rest[start + 1..],
        }
    }

    names
}

/// Name of the placeholder starting right after an opening `__`, if any.
fn token_name(s: &str) -> Option<&str> {
    let end = s.find("__")?;
    let name = &s[..end];
    let valid = !name.is_empty()
        && !name.starts_with('_')
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    valid.then_some(name)
}
