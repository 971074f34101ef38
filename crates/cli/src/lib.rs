#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the command-line front end of the `fswalk` binary. It
//! parses arguments with [`clap`](https://docs.rs/clap/), turns them into
//! [`walk::WalkOptions`], runs the traversal on a Tokio runtime and prints one
//! record per entry on stdout while non-fatal errors go to stderr.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for standard
//! output and error, so tests drive the whole front end in-process. Output
//! formats are plain lines, NUL-terminated paths (`-0`) and JSON lines
//! (`--json`). `--max-depth` maps onto [`walk::WalkOptions::max_depth`] and
//! `--exclude` onto a visit filter, so neither reads below what it prunes.
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as exit codes.
//! - Entries are written in the order the walker yields them; no sorting or
//!   buffering of the full result takes place.
//!
//! # Errors
//!
//! - `0`: the walk completed without errors.
//! - `1`: usage error, invalid option value or unusable root.
//! - `23`: the walk completed but some directories or entries could not be
//!   read (partial result).
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["fswalk", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8_lossy(&stdout).starts_with("fswalk "));
//! assert!(stderr.is_empty());
//! ```
//!
//! # See also
//!
//! - [`walk`] for the traversal engine.
//! - [`logging`] for the `--debug` categories.

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::error::ErrorKind;
use logging::VerbosityConfig;
use url::Url;
use walk::{WalkOptions, WalkRoot};

mod command;
mod render;

use command::{ParsedArgs, parse_args};
use render::OutputFormat;

/// Exit code of a walk that finished without errors.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for usage and configuration errors.
pub const EXIT_USAGE: i32 = 1;

/// Exit code of a walk that reported listing or metadata errors.
pub const EXIT_PARTIAL: i32 = 23;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Parsing entry points exposed for integration tests.
#[doc(hidden)]
pub mod test_utils {
    pub use crate::command::{ParsedArgs, parse_args};
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// The function returns the process exit code that should be used by the
/// caller.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                if write!(stdout, "{error}").is_err() {
                    return EXIT_USAGE;
                }
                EXIT_SUCCESS
            }
            _ => {
                let _ = write!(stderr, "{error}");
                EXIT_USAGE
            }
        },
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(u8::try_from(clamped).unwrap_or(u8::MAX))
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    let verbosity = match verbosity_from(&parsed) {
        Ok(verbosity) => verbosity,
        Err(error) => {
            let _ = writeln!(stderr, "fswalk: {error}");
            return EXIT_USAGE;
        }
    };
    // Fails only when a subscriber is already installed, e.g. repeated
    // in-process runs.
    let _ = logging::init_tracing(&verbosity);

    let root = match root_from(parsed.root.as_deref()) {
        Ok(root) => root,
        Err(error) => {
            let _ = writeln!(stderr, "fswalk: invalid root URL: {error}");
            return EXIT_USAGE;
        }
    };
    let format = if parsed.json {
        OutputFormat::Json
    } else if parsed.null {
        OutputFormat::Null
    } else {
        OutputFormat::Lines
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = writeln!(stderr, "fswalk: failed to start runtime: {error}");
            return EXIT_USAGE;
        }
    };

    let options = options_from(&parsed);
    runtime.block_on(walk_and_print(
        root,
        options,
        format,
        parsed.stats,
        stdout,
        stderr,
    ))
}

async fn walk_and_print<Out, Err>(
    root: WalkRoot,
    options: WalkOptions,
    format: OutputFormat,
    stats: bool,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    Out: Write,
    Err: Write,
{
    let started = Instant::now();
    let mut walk = match walk::walk(root, options) {
        Ok(walk) => walk,
        Err(error) => {
            let _ = writeln!(stderr, "fswalk: {error}");
            return EXIT_USAGE;
        }
    };
    let mut errors = walk.errors();

    while let Some(entry) = walk.next_entry().await {
        if let Err(error) = render::write_entry(stdout, &entry, format) {
            walk.cancel();
            if error.kind() == io::ErrorKind::BrokenPipe {
                return EXIT_SUCCESS;
            }
            let _ = writeln!(stderr, "fswalk: failed to write output: {error}");
            return EXIT_USAGE;
        }
        if let Some(errors) = errors.as_mut() {
            for error in errors.drain() {
                let _ = render::write_error(stderr, &error);
            }
        }
    }
    let _ = stdout.flush();

    if let Some(mut errors) = errors {
        while let Some(error) = errors.recv().await {
            let _ = render::write_error(stderr, &error);
        }
    }

    let progress = walk.progress();
    tracing::debug!(
        target: "fswalk::walk",
        "emitted {} entries with {} errors",
        progress.entries_emitted,
        progress.errors()
    );
    if stats {
        let _ = render::write_stats(stderr, &progress, started.elapsed());
    }
    if progress.errors() > 0 {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}

fn verbosity_from(parsed: &ParsedArgs) -> Result<VerbosityConfig, logging::FlagError> {
    let mut verbosity = VerbosityConfig::from_verbose_level(parsed.verbose);
    for list in &parsed.debug {
        verbosity.apply_debug_flags(list)?;
    }
    Ok(verbosity)
}

fn root_from(raw: Option<&OsStr>) -> Result<WalkRoot, url::ParseError> {
    let Some(raw) = raw else {
        return Ok(WalkRoot::from("."));
    };
    match raw.to_str() {
        Some(text) if text.starts_with("file:") => Url::parse(text).map(WalkRoot::from),
        _ => Ok(WalkRoot::from(PathBuf::from(raw))),
    }
}

fn options_from(parsed: &ParsedArgs) -> WalkOptions {
    let mut options = WalkOptions::new().follow_symlinks(!parsed.no_follow);
    if let Some(max) = parsed.max_concurrency {
        options = options.max_concurrency(max);
    }
    if let Some(max) = parsed.listing_concurrency {
        options = options.listing_concurrency(max);
    }
    if let Some(threshold) = parsed.backlog_threshold {
        options = options.backlog_threshold(threshold);
    }
    if let Some(depth) = parsed.max_depth {
        options = options.max_depth(depth);
    }
    if !parsed.excludes.is_empty() {
        let excludes = parsed.excludes.clone();
        options = options.visit(move |entry| !excludes.iter().any(|name| name == entry.name()));
    }
    options
}

#[cfg(test)]
mod tests;
