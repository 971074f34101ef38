//! Driver task owning all traversal state.
//!
//! The engine is the single place where queue ceilings, the outstanding
//! counter and the ahead counter change. It runs as one task and processes
//! completions and consumer pulls strictly one at a time, so none of that
//! state needs locking. The consumer talks to it only through channels.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use logging::trace_walk;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::entry::Entry;
use crate::error::WalkError;
use crate::flow::{Adjustment, FlowController, Step};
use crate::fs::FileSystem;
use crate::lister::{DirectoryTask, ListDirectory};
use crate::options::{ResolvedOptions, VisitFn};
use crate::prober::ProbeEntry;
use crate::progress::Progress;
use crate::queue::BoundedQueue;
use crate::stream::{Walk, WalkErrors};

/// Poll interval of a parked queue waiting for its ceiling to rise.
pub(crate) const IDLE_RECHECK: Duration = Duration::from_millis(1);

pub(crate) struct Engine<F: FileSystem> {
    root: PathBuf,
    pub(crate) directories: BoundedQueue<ListDirectory<F>>,
    pub(crate) entries: BoundedQueue<ProbeEntry<F>>,
    flow: FlowController,
    pub(crate) visit: Option<VisitFn>,
    pub(crate) max_depth: Option<usize>,
    /// Listings and probes scheduled but not yet completed.
    pub(crate) outstanding: usize,
    /// Entries emitted minus pulls observed.
    ahead: isize,
    output: Option<mpsc::UnboundedSender<Entry>>,
    errors: Option<mpsc::UnboundedSender<WalkError>>,
    pulls: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
    pub(crate) progress: Arc<Progress>,
    finished: bool,
}

/// Builds the engine for `root` and spawns its driver on `runtime`.
pub(crate) fn spawn<F: FileSystem>(
    root: PathBuf,
    options: ResolvedOptions,
    fs: F,
    runtime: &Handle,
) -> Walk {
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let (pull_tx, pull_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let progress = Arc::new(Progress::default());
    let fs = Arc::new(fs);

    let mut directories = BoundedQueue::new(
        "directories",
        ListDirectory::new(Arc::clone(&fs)),
        options.listing_concurrency,
    );
    // Listing stays paused until the consumer's first pull raises it.
    for _ in 0..options.listing_concurrency {
        directories.lower();
    }
    directories.push(DirectoryTask::root(root.clone()));

    let entries = BoundedQueue::new(
        "entries",
        ProbeEntry::new(fs),
        options.max_concurrency,
    );

    let engine = Engine {
        root: root.clone(),
        directories,
        entries,
        flow: FlowController::new(options.backlog_threshold, options.max_concurrency),
        visit: options.visit,
        max_depth: options.max_depth,
        outstanding: 1,
        ahead: 0,
        output: Some(output_tx),
        errors: Some(error_tx),
        pulls: pull_rx,
        cancel: cancel.clone(),
        progress: Arc::clone(&progress),
        finished: false,
    };
    runtime.spawn(engine.run());

    Walk::new(
        root,
        output_rx,
        WalkErrors::new(error_rx),
        pull_tx,
        cancel,
        progress,
    )
}

impl<F: FileSystem> Engine<F> {
    async fn run(mut self) {
        trace_walk!(
            "walk started at {} (backlog threshold {}, backpressure threshold {})",
            self.root.display(),
            self.flow.backlog_threshold(),
            self.flow.backpressure_threshold()
        );
        while !self.finished {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    trace_walk!("walk cancelled");
                    self.finish();
                }
                pull = self.pulls.recv() => match pull {
                    Some(()) => self.on_pull(),
                    None => {
                        trace_walk!("consumer went away");
                        self.finish();
                    }
                },
                Some(done) = self.directories.next_completion(), if self.directories.has_in_flight() => {
                    match done {
                        Ok(listing) => self.on_listed(listing),
                        Err(error) => self.on_task_failure("directories", &error),
                    }
                    self.after_completion();
                    self.directories.refill();
                }
                Some(done) = self.entries.next_completion(), if self.entries.has_in_flight() => {
                    match done {
                        Ok(probe) => self.on_probed(probe),
                        Err(error) => self.on_task_failure("entries", &error),
                    }
                    self.after_completion();
                    self.entries.refill();
                }
                () = tokio::time::sleep(IDLE_RECHECK), if self.needs_recheck() => {
                    self.directories.recheck();
                    self.entries.recheck();
                }
            }
        }
    }

    /// Flow step and end check shared by every listing and probe completion.
    fn after_completion(&mut self) {
        let adjustment = self.flow.after_completion(self.entries.len(), self.ahead);
        self.apply(adjustment);
        if self.outstanding == 0 {
            self.finish();
        }
    }

    fn on_pull(&mut self) {
        self.ahead -= 1;
        let adjustment = self.flow.on_pull(self.entries.len());
        self.apply(adjustment);
    }

    fn apply(&mut self, adjustment: Adjustment) {
        match adjustment.listing {
            Some(Step::Raise) => self.directories.raise(),
            Some(Step::Lower) => self.directories.lower(),
            None => {}
        }
        match adjustment.probing {
            Some(Step::Raise) => self.entries.raise(),
            Some(Step::Lower) => self.entries.lower(),
            None => {}
        }
    }

    fn needs_recheck(&self) -> bool {
        self.directories.needs_recheck() || self.entries.needs_recheck()
    }

    /// A unit of work panicked; its item is lost but still accounted for.
    fn on_task_failure(&mut self, stage: &'static str, error: &JoinError) {
        self.outstanding -= 1;
        tracing::error!(target: "fswalk::walk", "{} task failed: {}", stage, error);
    }

    pub(crate) fn emit(&mut self, entry: Entry) {
        let Some(output) = &self.output else {
            return;
        };
        if output.send(entry).is_ok() {
            self.ahead += 1;
            self.progress.record_emitted();
        }
    }

    pub(crate) fn report(&mut self, error: WalkError) {
        trace_walk!("{}", error);
        if let Some(errors) = &self.errors {
            if errors.send(error).is_err() {
                trace_walk!("error receiver dropped");
            }
        }
    }

    /// Stops both queues and closes the output, which ends the sequence.
    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.directories.stop();
        self.entries.stop();
        self.progress.mark_finished();
        self.output = None;
        self.errors = None;
        trace_walk!(
            "walk finished at {} (outstanding {}, ahead {})",
            self.root.display(),
            self.outstanding,
            self.ahead
        );
    }
}
