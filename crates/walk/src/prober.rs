//! Metadata probing stage.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use logging::trace_walk;

use crate::engine::Engine;
use crate::entry::{Entry, Metadata};
use crate::error::WalkError;
use crate::fs::FileSystem;
use crate::lister::DirectoryTask;
use crate::queue::Job;

/// A discovered name waiting for its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EntryTask {
    pub(crate) path: PathBuf,
    pub(crate) name: OsString,
    pub(crate) depth: usize,
}

#[derive(Debug)]
pub(crate) struct Probe {
    pub(crate) task: EntryTask,
    pub(crate) result: io::Result<Metadata>,
}

pub(crate) struct ProbeEntry<F> {
    fs: Arc<F>,
}

impl<F> ProbeEntry<F> {
    pub(crate) const fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> Job for ProbeEntry<F> {
    type Item = EntryTask;
    type Output = Probe;

    fn run(&self, task: EntryTask) -> impl Future<Output = Probe> + Send + 'static {
        let lookup = self.fs.metadata(task.path.clone());
        async move {
            let result = lookup.await;
            Probe { task, result }
        }
    }
}

impl<F: FileSystem> Engine<F> {
    /// Handles a finished probe: filters, recurses into directories, emits.
    pub(crate) fn on_probed(&mut self, probe: Probe) {
        self.outstanding -= 1;
        let Probe { task, result } = probe;
        let metadata = match result {
            Ok(metadata) => metadata,
            Err(source) => {
                self.progress.record_probe_error();
                self.report(WalkError::probe(task.path, task.name, task.depth, source));
                return;
            }
        };
        self.progress.record_probed();

        let entry = Entry {
            path: task.path,
            name: task.name,
            depth: task.depth,
            metadata,
        };

        if let Some(visit) = &self.visit {
            if !visit(&entry) {
                self.progress.record_pruned();
                trace_walk!("pruned {}", entry.path.display());
                return;
            }
        }

        let below_limit = self.max_depth.is_none_or(|max| entry.depth < max);
        if entry.is_dir() && below_limit {
            self.outstanding += 1;
            self.directories.push(DirectoryTask {
                path: entry.path.clone(),
                child_depth: entry.depth + 1,
            });
        }
        self.emit(entry);
    }
}
