//! Track identity generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out monotonically increasing track ids, starting at 1.
///
/// Every [`BYTETracker`](crate::BYTETracker) owns its own generator, so
/// trackers for different streams number their tracks independently.
/// Cloning a generator shares the counter; pass a clone to several
/// trackers when they must draw from one identity space.
#[derive(Debug, Clone, Default)]
pub struct TrackIdGenerator {
    counter: Arc<AtomicU64>,
}

impl TrackIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next unique track id.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last id handed out, 0 if none yet.
    pub fn last_id(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Restart numbering at 1 unless another handle shares the counter.
    ///
    /// A shared counter keeps running, since the other trackers may still
    /// hold live tracks with the ids handed out so far. Returns whether the
    /// counter was rewound.
    pub fn reset_if_exclusive(&mut self) -> bool {
        if Arc::strong_count(&self.counter) > 1 {
            return false;
        }
        self.counter.store(0, Ordering::SeqCst);
        true
    }
}
