//! Directory listing stage.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use logging::trace_walk;

use crate::engine::Engine;
use crate::error::WalkError;
use crate::fs::FileSystem;
use crate::prober::EntryTask;
use crate::queue::Job;

/// A directory waiting to be listed.
///
/// `child_depth` is the depth its children are emitted at: `0` for the
/// traversal root, `d + 1` for a directory entry found at depth `d`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DirectoryTask {
    pub(crate) path: PathBuf,
    pub(crate) child_depth: usize,
}

impl DirectoryTask {
    pub(crate) const fn root(path: PathBuf) -> Self {
        Self {
            path,
            child_depth: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Listing {
    pub(crate) task: DirectoryTask,
    pub(crate) result: io::Result<Vec<OsString>>,
}

pub(crate) struct ListDirectory<F> {
    fs: Arc<F>,
}

impl<F> ListDirectory<F> {
    pub(crate) const fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> Job for ListDirectory<F> {
    type Item = DirectoryTask;
    type Output = Listing;

    fn run(&self, task: DirectoryTask) -> impl Future<Output = Listing> + Send + 'static {
        let listing = self.fs.read_dir(task.path.clone());
        async move {
            let result = listing.await;
            Listing { task, result }
        }
    }
}

impl<F: FileSystem> Engine<F> {
    /// Handles a finished listing: fans the children out to the prober.
    pub(crate) fn on_listed(&mut self, listing: Listing) {
        self.outstanding -= 1;
        let Listing { task, result } = listing;
        match result {
            Ok(names) => {
                self.progress.record_listed();
                trace_walk!(
                    "listed {} ({} children)",
                    task.path.display(),
                    names.len()
                );
                for name in names {
                    self.outstanding += 1;
                    self.entries.push(EntryTask {
                        path: task.path.join(&name),
                        name,
                        depth: task.child_depth,
                    });
                }
            }
            Err(source) => {
                self.progress.record_listing_error();
                self.report(WalkError::listing(task.path, source));
            }
        }
    }
}
