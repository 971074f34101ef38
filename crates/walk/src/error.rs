use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use url::Url;

/// Error raised while validating walk parameters, before any I/O starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `max_concurrency` was zero.
    #[error("option 'max_concurrency' must be a positive integer")]
    ZeroConcurrency,

    /// `listing_concurrency` was zero.
    #[error("option 'listing_concurrency' must be a positive integer")]
    ZeroListingConcurrency,

    /// `backlog_threshold` was zero.
    #[error("option 'backlog_threshold' must be a positive integer")]
    ZeroBacklogThreshold,

    /// The root path was empty.
    #[error("'root' parameter must not be empty")]
    EmptyRoot,

    /// The root URL does not use the `file` scheme or carries a host.
    #[error("'root' parameter should be a path or a file URL, got {0}")]
    NotAFileUrl(Url),

    /// The current directory could not be determined to resolve a relative root.
    #[error("failed to resolve relative root against the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// The walk was started outside a tokio runtime.
    #[error("walk must be started from within a tokio runtime")]
    NoRuntime,
}

/// Non-fatal failure reported on the out-of-band error channel.
///
/// Neither variant terminates the traversal: a listing error leaves the
/// directory's subtree unexpanded and a probe error drops a single entry.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// A directory's children could not be listed.
    #[error("failed to read directory '{}': {source}", path.display())]
    Listing {
        /// Directory whose contents could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },

    /// Metadata for a discovered entry could not be fetched.
    #[error("failed to inspect metadata for '{}': {source}", path.display())]
    Probe {
        /// Absolute path of the entry.
        path: PathBuf,
        /// Final component of the path.
        name: OsString,
        /// Depth the entry would have been emitted at.
        depth: usize,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    pub(crate) fn listing(path: PathBuf, source: io::Error) -> Self {
        Self::Listing { path, source }
    }

    pub(crate) fn probe(path: PathBuf, name: OsString, depth: usize, source: io::Error) -> Self {
        Self::Probe {
            path,
            name,
            depth,
            source,
        }
    }

    /// Returns the filesystem path associated with the error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Listing { path, .. } | Self::Probe { path, .. } => path,
        }
    }

    /// Returns the underlying I/O error.
    #[must_use]
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Listing { source, .. } | Self::Probe { source, .. } => source,
        }
    }

    /// Reports whether the failure happened while listing a directory.
    #[must_use]
    pub const fn is_listing(&self) -> bool {
        matches!(self, Self::Listing { .. })
    }
}
