use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::entry::Entry;
use crate::error::WalkError;
use crate::progress::{Progress, WalkProgress};

/// Consumer handle of a running traversal.
///
/// Entries are pulled one at a time with [`next_entry`](Self::next_entry).
/// Every pull is also a demand signal: the driver only keeps discovering
/// entries while the consumer keeps asking for them, so a consumer that stops
/// pulling stops the traversal from racing ahead.
///
/// Dropping the handle cancels the traversal.
#[derive(Debug)]
pub struct Walk {
    root: PathBuf,
    entries: mpsc::UnboundedReceiver<Entry>,
    errors: Option<WalkErrors>,
    pulls: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
    progress: Arc<Progress>,
    /// A pull was sent whose entry has not been received yet.
    pull_pending: bool,
    exhausted: bool,
}

impl Walk {
    pub(crate) fn new(
        root: PathBuf,
        entries: mpsc::UnboundedReceiver<Entry>,
        errors: WalkErrors,
        pulls: mpsc::UnboundedSender<()>,
        cancel: CancellationToken,
        progress: Arc<Progress>,
    ) -> Self {
        Self {
            root,
            entries,
            errors: Some(errors),
            pulls,
            cancel,
            progress,
            pull_pending: false,
            exhausted: false,
        }
    }

    /// Absolute root the traversal started from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Waits for the next entry. `None` marks the end of the traversal and is
    /// returned for every call after that.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. A call dropped before it resolves leaves
    /// its demand signal pending, and the next call reuses it instead of
    /// signalling again, so abandoned calls never widen the read-ahead.
    pub async fn next_entry(&mut self) -> Option<Entry> {
        if self.exhausted {
            return None;
        }
        if !self.pull_pending {
            // Entries already buffered stay readable after the driver exits.
            if self.pulls.send(()).is_err() {
                logging::trace_walk!("pull after driver exit");
            }
            self.pull_pending = true;
        }
        let entry = self.entries.recv().await;
        self.pull_pending = false;
        if entry.is_none() {
            self.exhausted = true;
        }
        entry
    }

    /// Takes the error channel. Returns `None` after the first call.
    ///
    /// Errors are non-fatal: a directory that cannot be listed or an entry
    /// whose metadata cannot be read is reported here while the rest of the
    /// traversal continues. The channel closes when the traversal ends.
    pub fn errors(&mut self) -> Option<WalkErrors> {
        self.errors.take()
    }

    /// Stops the traversal. Entries already buffered can still be drained,
    /// after which [`next_entry`](Self::next_entry) returns `None`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current counters of the traversal.
    #[must_use]
    pub fn progress(&self) -> WalkProgress {
        self.progress.snapshot()
    }

    /// Drains every remaining entry.
    pub async fn collect_entries(mut self) -> Vec<Entry> {
        let mut collected = Vec::new();
        while let Some(entry) = self.next_entry().await {
            collected.push(entry);
        }
        collected
    }
}

impl Drop for Walk {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Receiving side of a traversal's non-fatal errors.
#[derive(Debug)]
pub struct WalkErrors {
    receiver: mpsc::UnboundedReceiver<WalkError>,
}

impl WalkErrors {
    pub(crate) const fn new(receiver: mpsc::UnboundedReceiver<WalkError>) -> Self {
        Self { receiver }
    }

    /// Waits for the next error; `None` once the traversal has ended and
    /// every error has been received.
    pub async fn recv(&mut self) -> Option<WalkError> {
        self.receiver.recv().await
    }

    /// Returns an already reported error without waiting.
    pub fn try_recv(&mut self) -> Option<WalkError> {
        self.receiver.try_recv().ok()
    }

    /// Collects every error reported so far without waiting.
    pub fn drain(&mut self) -> Vec<WalkError> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
