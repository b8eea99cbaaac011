//! # Logging
//!
//! `strongroom simulate` prints its report on stdout, so every tracing event
//! goes to stderr. `RUST_LOG` wins over `--log-level` when both are set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How stderr log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored, one event per line.
    Pretty,
    /// One JSON object per event, for piping into `jq`.
    Json,
}

/// Installs the global subscriber. Must run once, before the scenario loads.
///
/// `default_level` is an `EnvFilter` directive such as `"info"` or
/// `"strongroom_protocol=debug"`, used only when `RUST_LOG` is unset.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_file(false))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    tracing::debug!(?format, "logging ready");
}
