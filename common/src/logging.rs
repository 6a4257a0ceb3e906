//! Structured logging initialization
//!
//! Log lines go to standard output. `LOG_FORMAT=json` switches to one JSON
//! object per line; `RUST_LOG` adds filter directives on top of INFO.

use crate::config::{EnvSource, ProcessEnv};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Guard that keeps the tracing subscriber active.
/// Drop this at the end of main to flush logs.
pub struct LogGuard;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Read the format from `LOG_FORMAT` in the given source.
    pub fn from_source(source: &impl EnvSource) -> Self {
        match source.get("LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialize structured logging for a component.
///
/// Returns a guard that should be held for the lifetime of the program.
/// Calling this twice keeps the first subscriber.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("create-users");
/// info!("Starting up...");
/// ```
pub fn init_logging(_component: &str) -> LogGuard {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let layer = match LogFormat::from_source(&ProcessEnv) {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(std::io::stdout)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stdout)
            .boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();

    LogGuard
}
