//! Feedback rules that retune the two queue ceilings.
//!
//! Two loops run independently of each other:
//!
//! - the *backlog* loop watches how many discovered names are waiting for a
//!   metadata probe and slows directory listing down when that backlog grows
//!   past [`FlowController::backlog_threshold`];
//! - the *backpressure* loop watches how far emission runs ahead of the
//!   consumer and throttles probing once that lead reaches
//!   [`FlowController::backpressure_threshold`].
//!
//! The controller only decides. The driver applies each [`Step`] through the
//! queues' public `raise`/`lower` operations.

use logging::trace_flow;

/// Default number of pending metadata probes tolerated before listing slows down.
pub const DEFAULT_BACKLOG_THRESHOLD: usize = 5000;

/// Direction of a one-step ceiling adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Raise,
    Lower,
}

/// Ceiling adjustments for both queues. `None` leaves a queue untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Adjustment {
    pub(crate) listing: Option<Step>,
    pub(crate) probing: Option<Step>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FlowController {
    backlog_threshold: usize,
    backpressure_threshold: usize,
}

impl FlowController {
    pub(crate) const fn new(backlog_threshold: usize, backpressure_threshold: usize) -> Self {
        Self {
            backlog_threshold,
            backpressure_threshold,
        }
    }

    pub(crate) const fn backlog_threshold(&self) -> usize {
        self.backlog_threshold
    }

    pub(crate) const fn backpressure_threshold(&self) -> usize {
        self.backpressure_threshold
    }

    /// Decision taken after any listing or probe completion.
    pub(crate) fn after_completion(&self, probe_backlog: usize, ahead: isize) -> Adjustment {
        let listing = if probe_backlog > self.backlog_threshold {
            Step::Lower
        } else {
            Step::Raise
        };
        let probing = if ahead < self.backpressure_limit() {
            Step::Raise
        } else {
            Step::Lower
        };
        trace_flow!(
            "completion: backlog={} ahead={} -> listing {:?}, probing {:?}",
            probe_backlog,
            ahead,
            listing,
            probing
        );
        Adjustment {
            listing: Some(listing),
            probing: Some(probing),
        }
    }

    /// Decision taken when the consumer pulls an entry.
    ///
    /// A pull is evidence of consumer readiness, so probing always speeds up;
    /// listing speeds up only while the probe backlog has room.
    pub(crate) fn on_pull(&self, probe_backlog: usize) -> Adjustment {
        let listing = (probe_backlog < self.backlog_threshold).then_some(Step::Raise);
        trace_flow!("pull: backlog={} -> listing {:?}", probe_backlog, listing);
        Adjustment {
            listing,
            probing: Some(Step::Raise),
        }
    }

    fn backpressure_limit(&self) -> isize {
        isize::try_from(self.backpressure_threshold).unwrap_or(isize::MAX)
    }
}
