//! Filesystem primitives consumed by the walker.
//!
//! The engine only needs two asynchronous operations: list the names inside a
//! directory and fetch the metadata of a path. [`FileSystem`] is the seam that
//! lets tests and alternative backends replace the operating system.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::PathBuf;

use logging::trace_fs;

use crate::entry::Metadata;

/// Asynchronous listing and metadata primitives.
///
/// Returned futures must own everything they touch; the engine spawns them on
/// the runtime and observes their completion from its driver task.
pub trait FileSystem: Send + Sync + 'static {
    /// Lists the child names of `path`, in whatever order the backend yields.
    fn read_dir(
        &self,
        path: PathBuf,
    ) -> impl Future<Output = io::Result<Vec<OsString>>> + Send + 'static;

    /// Fetches the metadata of `path`.
    fn metadata(&self, path: PathBuf) -> impl Future<Output = io::Result<Metadata>> + Send + 'static;
}

/// [`FileSystem`] backed by [`tokio::fs`].
#[derive(Clone, Copy, Debug)]
pub struct TokioFs {
    follow_symlinks: bool,
}

impl TokioFs {
    /// Creates a backend; `follow_symlinks` selects `stat` over `lstat`.
    #[must_use]
    pub const fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    /// Reports whether metadata lookups follow symbolic links.
    #[must_use]
    pub const fn follows_symlinks(&self) -> bool {
        self.follow_symlinks
    }
}

impl Default for TokioFs {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FileSystem for TokioFs {
    fn read_dir(
        &self,
        path: PathBuf,
    ) -> impl Future<Output = io::Result<Vec<OsString>>> + Send + 'static {
        async move {
            trace_fs!("read_dir {}", path.display());
            let mut reader = tokio::fs::read_dir(&path).await?;
            let mut names = Vec::new();
            while let Some(entry) = reader.next_entry().await? {
                names.push(entry.file_name());
            }
            Ok(names)
        }
    }

    fn metadata(&self, path: PathBuf) -> impl Future<Output = io::Result<Metadata>> + Send + 'static {
        let follow = self.follow_symlinks;
        async move {
            trace_fs!("metadata {} follow={}", path.display(), follow);
            let metadata = if follow {
                tokio::fs::metadata(&path).await?
            } else {
                tokio::fs::symlink_metadata(&path).await?
            };
            Ok(Metadata::from(metadata))
        }
    }
}
