//! Tracing setup shared by the shortlink binaries.
//!
//! The output format is chosen by deployment [`Environment`]:
//!
//! | environment | format | default level |
//! |-------------|--------|---------------|
//! | `local`     | pretty | `debug`       |
//! | `dev`       | JSON   | `debug`       |
//! | `prod`      | JSON   | `info`        |
//!
//! `RUST_LOG` overrides the default level when set.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("unknown environment '{0}', expected one of: local, dev, prod")]
    UnknownEnvironment(String),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("failed to install log bridge: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
}

/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

impl Environment {
    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(self) -> &'static str {
        match self {
            Environment::Local | Environment::Dev => "debug",
            Environment::Prod => "info",
        }
    }

    pub fn is_json(self) -> bool {
        !matches!(self, Environment::Local)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Dev => write!(f, "dev"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

impl FromStr for Environment {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(TelemetryError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Builds the filter for `env`, honouring `RUST_LOG` when present.
pub fn env_filter(env: Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env.default_directive()))
}

/// Builds a subscriber for `env` writing to `writer`.
pub fn subscriber<W>(
    env: Environment,
    filter: EnvFilter,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer);

    if env.is_json() {
        Box::new(
            builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        )
    } else {
        Box::new(builder.pretty().with_ansi(true).finish())
    }
}

/// Installs the global subscriber for `env` on stdout and bridges `log`
/// records from dependencies into it.
///
/// Must be called once, before any other tracing happens.
pub fn init(env: Environment) -> Result<(), TelemetryError> {
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber(env, env_filter(env), std::io::stdout))?;
    Ok(())
}
