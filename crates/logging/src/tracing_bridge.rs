//! Subscriber setup mapping a [`VerbosityConfig`] onto `tracing-subscriber`.
//!
//! The configuration is rendered as [`EnvFilter`] directives so each
//! [`DebugFlag`](crate::DebugFlag) controls exactly one target. When
//! `RUST_LOG` is set and valid it replaces the rendered directives entirely.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flag("flow2")?;
//! init_tracing(&config)?;
//!
//! logging::trace_walk!("walk started");
//! ```

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use super::config::VerbosityConfig;

/// Builds the filter for `config`, preferring a valid `RUST_LOG`.
#[must_use]
pub fn env_filter(config: &VerbosityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.to_env_filter_directives()))
}

/// Builds a subscriber for `config` that writes formatted events to `writer`.
///
/// `RUST_LOG` is not consulted, which keeps the output deterministic for
/// callers capturing it.
pub fn subscriber_with_writer<W>(
    config: &VerbosityConfig,
    writer: W,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    build(EnvFilter::new(config.to_env_filter_directives()), writer)
}

/// Installs the global subscriber writing to stderr.
///
/// Fails when a global subscriber has already been installed.
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), TryInitError> {
    build(env_filter(config), std::io::stderr).try_init()
}

fn build<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    tracing_subscriber::registry().with(filter).with(layer)
}
