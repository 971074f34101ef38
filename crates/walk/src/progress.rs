use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Live counters updated by the driver and read by the consumer handle.
#[derive(Debug, Default)]
pub(crate) struct Progress {
    entries_emitted: AtomicU64,
    directories_listed: AtomicU64,
    entries_probed: AtomicU64,
    entries_pruned: AtomicU64,
    listing_errors: AtomicU64,
    probe_errors: AtomicU64,
    finished: AtomicBool,
}

impl Progress {
    pub(crate) fn record_emitted(&self) {
        self.entries_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_listed(&self) {
        self.directories_listed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_probed(&self) {
        self.entries_probed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pruned(&self) {
        self.entries_pruned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_listing_error(&self) {
        self.listing_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_probe_error(&self) {
        self.probe_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> WalkProgress {
        WalkProgress {
            entries_emitted: self.entries_emitted.load(Ordering::Relaxed),
            directories_listed: self.directories_listed.load(Ordering::Relaxed),
            entries_probed: self.entries_probed.load(Ordering::Relaxed),
            entries_pruned: self.entries_pruned.load(Ordering::Relaxed),
            listing_errors: self.listing_errors.load(Ordering::Relaxed),
            probe_errors: self.probe_errors.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time view of a walk's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkProgress {
    /// Entries handed to the output sequence.
    pub entries_emitted: u64,
    /// Directory listings that completed successfully.
    pub directories_listed: u64,
    /// Metadata probes that completed successfully.
    pub entries_probed: u64,
    /// Entries rejected by the visit filter.
    pub entries_pruned: u64,
    /// Directories that could not be listed.
    pub listing_errors: u64,
    /// Entries whose metadata could not be fetched.
    pub probe_errors: u64,
    /// Whether the driver has terminated the sequence.
    pub finished: bool,
}

impl WalkProgress {
    /// Total non-fatal errors reported so far.
    #[must_use]
    pub const fn errors(&self) -> u64 {
        self.listing_errors + self.probe_errors
    }
}
