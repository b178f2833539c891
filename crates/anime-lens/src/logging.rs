//! Subscriber setup for applications embedding the library.
//!
//! The crate itself only emits `tracing` spans/events (and a few `log`
//! records). Hosts call [`init_logging`] once at startup.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable holding a filter directive, checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "ANIME_LENS_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("A global tracing subscriber is already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge `log` records into tracing: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when neither `ANIME_LENS_LOG` nor `RUST_LOG` is set.
    pub default_directive: String,
    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            json: false,
        }
    }
}

/// Builds the filter: `ANIME_LENS_LOG`, then `RUST_LOG`, then the default.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs the global subscriber and routes `log` records through it.
pub fn init_logging(options: &LogOptions) -> Result<(), LoggingError> {
    let filter = env_filter(&options.default_directive);

    if options.json {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true));
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true));
        tracing::subscriber::set_global_default(subscriber)?;
    }

    tracing_log::LogTracer::init()?;
    Ok(())
}
