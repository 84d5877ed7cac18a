use core::sync::atomic::{AtomicBool, Ordering};

/// Arbiter for the graph's update responsibility.
///
/// Exactly one transport engine steps the graph from its interrupt; the
/// first one to [`claim`](Self::claim) gets the job.
pub struct TimingSource {
    claimed: AtomicBool,
}

impl TimingSource {
    pub const fn new() -> Self {
        TimingSource {
            claimed: AtomicBool::new(false),
        }
    }

    /// Returns `true` for the first caller only.
    pub fn claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

impl Default for TimingSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The system-wide timing source.
pub static GRAPH_TIMING: TimingSource = TimingSource::new();
