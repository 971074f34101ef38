//! Bounded executor shared by the listing and probing stages.
//!
//! A [`BoundedQueue`] runs one asynchronous unit of work per admitted item,
//! never starting more than its current ceiling allows. The ceiling moves one
//! step at a time between `0` and the maximum given at construction. Lowering
//! it throttles future dispatch only; work already in flight always runs to
//! completion.
//!
//! The queue does not interpret results. Its owner awaits
//! [`BoundedQueue::next_completion`], handles the output, and then calls
//! [`BoundedQueue::refill`] so the freed slot can be reused.

use std::collections::VecDeque;
use std::future::Future;

use logging::trace_queue;
use tokio::task::{JoinError, JoinSet};

/// A unit of asynchronous work executed by a [`BoundedQueue`].
pub(crate) trait Job: Send + Sync + 'static {
    /// Item admitted into the queue.
    type Item: Send + 'static;
    /// Result handed back to the owner once the work completes.
    type Output: Send + 'static;

    /// Starts the work for `item`.
    fn run(&self, item: Self::Item) -> impl Future<Output = Self::Output> + Send + 'static;
}

pub(crate) struct BoundedQueue<J: Job> {
    name: &'static str,
    job: J,
    backlog: VecDeque<J::Item>,
    in_flight: JoinSet<J::Output>,
    running: usize,
    ceiling: usize,
    max_ceiling: usize,
    stopped: bool,
    parked: bool,
}

impl<J: Job> BoundedQueue<J> {
    /// Creates a queue whose ceiling starts at `max_ceiling`.
    pub(crate) fn new(name: &'static str, job: J, max_ceiling: usize) -> Self {
        Self {
            name,
            job,
            backlog: VecDeque::new(),
            in_flight: JoinSet::new(),
            running: 0,
            ceiling: max_ceiling,
            max_ceiling,
            stopped: false,
            parked: false,
        }
    }

    /// Admits `item`, starting it at once when capacity allows.
    pub(crate) fn push(&mut self, item: J::Item) {
        if self.stopped {
            return;
        }
        if self.running < self.ceiling {
            self.dispatch(item);
        } else {
            self.backlog.push_back(item);
        }
    }

    /// Raises the ceiling by one step and starts one backlog item if possible.
    pub(crate) fn raise(&mut self) {
        if self.stopped || self.ceiling == self.max_ceiling {
            return;
        }
        self.ceiling += 1;
        trace_queue!("{} ceiling raised to {}", self.name, self.ceiling);
        self.refill();
    }

    /// Lowers the ceiling by one step; reaching zero parks the queue.
    pub(crate) fn lower(&mut self) {
        if self.ceiling == 0 {
            return;
        }
        self.ceiling -= 1;
        trace_queue!("{} ceiling lowered to {}", self.name, self.ceiling);
        if self.ceiling == 0 {
            self.parked = true;
        }
    }

    /// Idle re-check of a parked queue.
    ///
    /// While the ceiling stays at zero the queue remains parked. Once it has
    /// been raised the queue unparks and starts a backlog item if capacity
    /// allows.
    pub(crate) fn recheck(&mut self) {
        if self.stopped || self.ceiling == 0 {
            return;
        }
        self.parked = false;
        self.refill();
    }

    /// Starts one backlog item when running work is below the ceiling.
    pub(crate) fn refill(&mut self) {
        if self.stopped || self.running >= self.ceiling {
            return;
        }
        if let Some(item) = self.backlog.pop_front() {
            self.dispatch(item);
        }
    }

    /// Awaits the next finished unit of work.
    ///
    /// Returns `None` when nothing is in flight. Completions observed after
    /// [`stop`](Self::stop) are swallowed: the running count is updated but
    /// the caller is not handed the result.
    pub(crate) async fn next_completion(&mut self) -> Option<Result<J::Output, JoinError>> {
        loop {
            let completed = self.in_flight.join_next().await?;
            self.running = self.running.saturating_sub(1);
            if !self.stopped {
                return Some(completed);
            }
        }
    }

    /// Permanently stops dispatch. In-flight work is detached and its results
    /// are discarded.
    pub(crate) fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.parked = false;
        trace_queue!(
            "{} stopped with {} running and {} queued",
            self.name,
            self.running,
            self.backlog.len()
        );
        self.backlog.clear();
        self.in_flight.detach_all();
        self.running = 0;
    }

    /// Number of admitted items waiting for a slot.
    pub(crate) fn len(&self) -> usize {
        self.backlog.len()
    }

    #[cfg(test)]
    pub(crate) const fn running(&self) -> usize {
        self.running
    }

    #[cfg(test)]
    pub(crate) const fn ceiling(&self) -> usize {
        self.ceiling
    }

    #[cfg(test)]
    pub(crate) const fn max_ceiling(&self) -> usize {
        self.max_ceiling
    }

    #[cfg(test)]
    pub(crate) const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether the driver should keep polling this queue via idle re-checks.
    pub(crate) fn needs_recheck(&self) -> bool {
        self.parked && !self.stopped && !self.backlog.is_empty()
    }

    /// Whether completions may still arrive.
    pub(crate) fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    fn dispatch(&mut self, item: J::Item) {
        self.running += 1;
        trace_queue!(
            "{} dispatch ({} running, ceiling {}, {} queued)",
            self.name,
            self.running,
            self.ceiling,
            self.backlog.len()
        );
        self.in_flight.spawn(self.job.run(item));
    }
}
