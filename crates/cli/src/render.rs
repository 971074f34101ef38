//! Rendering of entries, errors and the summary.

use std::io::{self, Write};
use std::time::{Duration, UNIX_EPOCH};

use serde::Serialize;
use walk::{Entry, WalkError, WalkProgress};

/// How entries are printed on stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// One path per line.
    Lines,
    /// One path per NUL-terminated record.
    Null,
    /// One JSON object per line.
    Json,
}

/// JSON shape of an entry.
#[derive(Serialize)]
struct JsonEntry<'a> {
    path: std::borrow::Cow<'a, str>,
    name: std::borrow::Cow<'a, str>,
    depth: usize,
    kind: &'static str,
    len: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
}

impl<'a> From<&'a Entry> for JsonEntry<'a> {
    fn from(entry: &'a Entry) -> Self {
        let metadata = entry.metadata();
        Self {
            path: entry.path().to_string_lossy(),
            name: entry.name().to_string_lossy(),
            depth: entry.depth(),
            kind: metadata.kind().as_str(),
            len: metadata.len(),
            modified: metadata
                .modified()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|elapsed| elapsed.as_secs()),
            mode: metadata.mode(),
        }
    }
}

pub(crate) fn write_entry<W: Write>(
    out: &mut W,
    entry: &Entry,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Lines => writeln!(out, "{}", entry.path().display()),
        OutputFormat::Null => {
            write_path_bytes(out, entry)?;
            out.write_all(b"\0")
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, &JsonEntry::from(entry)).map_err(io::Error::other)?;
            out.write_all(b"\n")
        }
    }
}

#[cfg(unix)]
fn write_path_bytes<W: Write>(out: &mut W, entry: &Entry) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    out.write_all(entry.path().as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn write_path_bytes<W: Write>(out: &mut W, entry: &Entry) -> io::Result<()> {
    out.write_all(entry.path().to_string_lossy().as_bytes())
}

pub(crate) fn write_error<W: Write>(err: &mut W, error: &WalkError) -> io::Result<()> {
    writeln!(err, "fswalk: {error}")
}

pub(crate) fn write_stats<W: Write>(
    err: &mut W,
    progress: &WalkProgress,
    elapsed: Duration,
) -> io::Result<()> {
    writeln!(err, "Number of entries: {}", progress.entries_emitted)?;
    writeln!(err, "Directories listed: {}", progress.directories_listed)?;
    writeln!(err, "Metadata lookups: {}", progress.entries_probed)?;
    writeln!(err, "Entries pruned: {}", progress.entries_pruned)?;
    writeln!(
        err,
        "Errors: {} ({} listing, {} metadata)",
        progress.errors(),
        progress.listing_errors,
        progress.probe_errors
    )?;
    writeln!(err, "Elapsed: {:.3}s", elapsed.as_secs_f64())
}
