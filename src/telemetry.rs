//! Log setup for the CLI. Records go to stderr so stdout stays a clean JSON
//! or CSV channel.

use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose request-level logging drowns out per-record analysis logs.
const QUIET_DEPENDENCIES: [&str; 3] = ["reqwest", "hyper_util", "rustls"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{directive}'")]
    Filter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

/// Directive built from `APP_LOG_LEVEL`; the HTTP stack is held at `warn`.
pub fn filter_directive(log_level: &str) -> String {
    let level = match log_level.trim() {
        "" => "info",
        level => level,
    };

    QUIET_DEPENDENCIES
        .iter()
        .fold(level.to_string(), |directive, target| {
            format!("{directive},{target}=warn")
        })
}

/// `RUST_LOG` wins over the configured level when it is set and valid.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = filter_directive(&config.log_level);
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::Filter { directive, source })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(|err| TelemetryError::Subscriber(err.to_string()))
}
