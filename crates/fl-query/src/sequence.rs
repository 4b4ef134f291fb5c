//! # Request Sequencing
//!
//! Callers that fire overlapping queries (a table refresh and a chart refresh,
//! or repeated refreshes while typing) tag each one with an id from a
//! [`RequestSequencer`] and drop any response whose id is no longer the newest
//! issued. The engine never looks at these ids.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    discarded: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next id. Ids start at 1 and only grow.
    pub fn next_id(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Most recently issued id, 0 before the first call to [`next_id`](Self::next_id).
    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// `true` if the response for `id` should be shown, i.e. no newer request
    /// has been issued since. Stale ids are counted as discarded.
    pub fn accept(&self, id: u64) -> bool {
        let current = id == self.latest();
        if !current {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
        current
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}
