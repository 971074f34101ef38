#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the diagnostic categories of the fswalk workspace. Library
//! code emits events through the `trace_*!` macros, each bound to one tracing
//! target, and front ends decide what is shown through a [`VerbosityConfig`].
//!
//! # Design
//!
//! - [`DebugFlag`] names a category; [`DebugLevels`] stores one level per
//!   flag.
//! - [`VerbosityConfig`] is built from a `-v` count and refined with
//!   `--debug` tokens such as `queue2` or `all`.
//! - With the `tracing` feature, `init_tracing` renders the configuration as
//!   `EnvFilter` directives and installs a formatting subscriber on stderr.
//!
//! # Invariants
//!
//! - Every macro emits on the target returned by [`DebugFlag::target`].
//! - A level of `0` never lets an event of that flag through.
//!
//! # Errors
//!
//! [`FlagError`] reports unknown flag names and malformed levels.
//!
//! # Examples
//!
//! ```
//! use logging::{DebugFlag, VerbosityConfig};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flags("flow2,fs").unwrap();
//! assert_eq!(config.debug.get(DebugFlag::Flow), 2);
//! assert_eq!(
//!     config.to_env_filter_directives(),
//!     "warn,fswalk::walk=debug,fswalk::flow=trace,fswalk::fs=trace"
//! );
//! ```

mod config;
mod levels;
#[cfg(feature = "tracing")]
mod tracing_bridge;
mod tracing_macros;

pub use config::{FlagError, VerbosityConfig};
pub use levels::{DebugFlag, DebugLevels};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{env_filter, init_tracing, subscriber_with_writer};
