/// Why a [`Scheduler::wait_until`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake<E> {
    Input(E),
    Timeout,
}

/// Cooperative scheduler for the presentation loop.
///
/// Every phase suspends through `wait_until`, so one implementation
/// decides both timing and input delivery.
pub trait Scheduler {
    type Event;

    /// Current clock reading in nanoseconds.
    fn now(&self) -> u64;

    /// Blocks until the next input event or until `deadline` (ns) passes.
    /// `None` waits for input without a timeout.
    ///
    /// Events already queued when the deadline is reached are delivered
    /// before the timeout is reported.
    fn wait_until(&mut self, deadline: Option<u64>) -> Wake<Self::Event>;

    /// Deadline `ms` milliseconds from now.
    fn deadline_in(&self, ms: u64) -> u64 {
        self.now() + ms * 1_000_000
    }
}
