#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` enumerates every file and directory beneath a root on a Tokio
//! runtime. Directory listings and metadata lookups run concurrently, and
//! results are handed to the consumer one [`Entry`] at a time through a
//! pull-based handle. The walker keeps its memory and I/O bounded: it only
//! discovers as much of the tree as the consumer is about to need.
//!
//! # Design
//!
//! - A single driver task owns all traversal state. Listing and probing work
//!   runs in two bounded queues whose concurrency ceilings move one step at a
//!   time between zero and their configured maximum.
//! - After every completion and every consumer pull, the flow controller
//!   compares the pending probe backlog with the backlog threshold and the
//!   number of emitted but unpulled entries with the maximum concurrency, and
//!   raises or lowers each ceiling accordingly.
//! - [`Walk`] is the consumer side. [`Walk::next_entry`] doubles as the demand
//!   signal, and [`Walk::errors`] exposes non-fatal failures out of band.
//! - [`FileSystem`] abstracts the two primitives the engine needs. [`TokioFs`]
//!   is the default backend.
//!
//! # Invariants
//!
//! - The root itself is never emitted. Its children have depth `0`; each
//!   directory boundary below adds one.
//! - At most `max_concurrency` probes and `listing_concurrency` listings are
//!   in flight, except transiently while a ceiling is being lowered. Lowering
//!   a ceiling never cancels running work.
//! - Entries rejected by the visit filter are neither emitted nor descended
//!   into.
//! - The sequence ends exactly when every scheduled listing and probe has
//!   completed, or when the walk is cancelled or its handle dropped.
//! - No order is guaranteed between siblings.
//!
//! # Errors
//!
//! [`ConfigError`] is returned synchronously by [`WalkBuilder::build`] and
//! [`walk()`] before any I/O starts. Per-node failures surface as
//! [`WalkError`] values on the [`WalkErrors`] channel; the affected entry or
//! subtree is skipped and the traversal carries on.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeSet;
//! use std::fs;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! fs::create_dir(temp.path().join("a"))?;
//! fs::write(temp.path().join("a/x.txt"), b"x")?;
//! fs::write(temp.path().join("f.txt"), b"f")?;
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()?;
//! let seen = runtime.block_on(async {
//!     let mut walk = walk::walk(temp.path(), walk::WalkOptions::new())?;
//!     let mut seen = BTreeSet::new();
//!     while let Some(entry) = walk.next_entry().await {
//!         seen.insert((entry.relative_to(temp.path()).map(PathBuf::from), entry.depth()));
//!     }
//!     Ok::<_, walk::ConfigError>(seen)
//! })?;
//!
//! assert!(seen.contains(&(Some(PathBuf::from("a")), 0)));
//! assert!(seen.contains(&(Some(PathBuf::from("a/x.txt")), 1)));
//! assert!(seen.contains(&(Some(PathBuf::from("f.txt")), 0)));
//! # Ok(())
//! # }
//! ```
//!
//! # See also
//!
//! - [`WalkOptions`] for the tunables and their defaults.
//! - The `logging` crate for the `walk`, `queue`, `flow` and `fs` debug
//!   categories emitted by this crate.

mod builder;
mod engine;
mod entry;
mod error;
mod flow;
mod fs;
mod lister;
mod options;
mod prober;
mod progress;
mod queue;
mod stream;

pub use crate::builder::{WalkBuilder, walk};
pub use crate::entry::{Entry, FileKind, Metadata};
pub use crate::error::{ConfigError, WalkError};
pub use crate::flow::DEFAULT_BACKLOG_THRESHOLD;
pub use crate::fs::{FileSystem, TokioFs};
pub use crate::options::{
    DEFAULT_LISTING_CONCURRENCY, DEFAULT_MAX_CONCURRENCY, MAX_CONCURRENCY_ENV, WalkOptions,
    WalkRoot,
};
pub use crate::progress::WalkProgress;
pub use crate::stream::{Walk, WalkErrors};

#[cfg(test)]
mod tests;
