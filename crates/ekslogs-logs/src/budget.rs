use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared delivery budget for one retrieval.
///
/// Reservation is a single compare-and-swap, so concurrent fetchers can never
/// deliver more than `limit` entries between them.
#[derive(Debug)]
pub struct RetrievalBudget {
    /// 0 = unlimited
    limit: usize,
    consumed: AtomicUsize,
}

impl RetrievalBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            consumed: AtomicUsize::new(0),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == 0
    }

    /// Reserve one unit. Returns false once the limit is reached.
    pub fn try_reserve(&self) -> bool {
        if self.is_unlimited() {
            self.consumed.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        self.consumed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |consumed| {
                (consumed < self.limit).then_some(consumed + 1)
            })
            .is_ok()
    }

    /// Remaining units, `None` when unlimited
    pub fn remaining(&self) -> Option<usize> {
        if self.is_unlimited() {
            return None;
        }
        Some(self.limit.saturating_sub(self.consumed.load(Ordering::Acquire)))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }

    /// Page size for the next request: `max` capped by the remaining budget,
    /// `None` when nothing remains
    pub fn page_size(&self, max: usize) -> Option<usize> {
        match self.remaining() {
            None => Some(max),
            Some(0) => None,
            Some(remaining) => Some(remaining.min(max)),
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed.load(Ordering::Acquire)
    }
}
