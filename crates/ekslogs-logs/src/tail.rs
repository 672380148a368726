//! Follow mode: re-query an overlapping trailing window on a fixed interval and
//! hand over only entries not shown before.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ekslogs_types::{LogEntry, RetrievalRequest};

use crate::error::Result;
use crate::fetch::Retriever;
use crate::seen::{DEFAULT_SEEN_CAPACITY, DEFAULT_SEEN_RETENTION_SECS, SeenIndex, SeenKey};

/// Default polling interval
pub const DEFAULT_TAIL_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-tick delivery limit
pub const DEFAULT_TICK_LIMIT: usize = 100;

/// Default look-back for the first tick
pub const DEFAULT_WARMUP_SECS: i64 = 60;

/// Tail loop tuning
#[derive(Clone, Debug)]
pub struct TailOptions {
    pub interval: Duration,
    /// Limit applied to each tick's retrieval
    pub tick_limit: usize,
    /// How far back the first window reaches
    pub warmup: chrono::Duration,
    pub seen_capacity: usize,
    pub seen_retention: chrono::Duration,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TAIL_INTERVAL,
            tick_limit: DEFAULT_TICK_LIMIT,
            warmup: chrono::Duration::seconds(DEFAULT_WARMUP_SECS),
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            seen_retention: chrono::Duration::seconds(DEFAULT_SEEN_RETENTION_SECS),
        }
    }
}

/// Watermark and dedup index for one tail session
#[derive(Debug)]
pub struct TailState {
    watermark: DateTime<Utc>,
    seen: SeenIndex,
}

impl TailState {
    pub fn new(watermark: DateTime<Utc>, seen: SeenIndex) -> Self {
        Self { watermark, seen }
    }

    /// Decide whether an entry goes to the sink. Admitted entries are recorded
    /// and move the watermark forward; the watermark never moves back.
    pub fn admit(&mut self, entry: &LogEntry) -> bool {
        let key = SeenKey::of(entry);
        if self.seen.contains(&key) || entry.timestamp < self.watermark {
            return false;
        }

        self.seen.insert(key, entry.timestamp);
        self.watermark = self.watermark.max(entry.timestamp);
        true
    }

    /// Request for the window `[watermark, now]`
    pub fn tick_request(
        &self,
        template: &RetrievalRequest,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RetrievalRequest {
        template
            .clone()
            .with_window(Some(self.watermark), Some(now))
            .with_limit(limit)
    }

    pub fn prune(&mut self) {
        self.seen.prune(self.watermark);
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    pub fn seen(&self) -> &SeenIndex {
        &self.seen
    }
}

/// Drives the polling loop
pub struct Tailer {
    retriever: Retriever,
    options: TailOptions,
}

impl Tailer {
    pub fn new(retriever: Retriever, options: TailOptions) -> Self {
        Self { retriever, options }
    }

    /// Tail until `cancel` fires. Cancellation returns `Ok(())`.
    ///
    /// A failed tick is logged and the next tick proceeds, so log types that
    /// have no streams yet are picked up once they appear. Only a missing log
    /// group ends the session with an error.
    pub async fn run<F>(
        &self,
        template: &RetrievalRequest,
        cancel: &CancellationToken,
        sink: F,
    ) -> Result<()>
    where
        F: Fn(LogEntry) + Sync,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            groups = self.retriever.log_groups(template.cluster()) => { groups?; }
        }

        let state = Mutex::new(TailState::new(
            Utc::now() - self.options.warmup,
            SeenIndex::new(self.options.seen_capacity, self.options.seen_retention),
        ));
        debug!(
            interval = ?self.options.interval,
            watermark = %state.lock().watermark(),
            "starting tail"
        );

        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let request = state
                .lock()
                .tick_request(template, Utc::now(), self.options.tick_limit);

            let result = self
                .retriever
                .retrieve(&request, cancel, |entry| {
                    let mut state = state.lock();
                    if state.admit(&entry) {
                        sink(entry);
                    }
                })
                .await;

            if cancel.is_cancelled() {
                return Ok(());
            }
            match result {
                Ok(()) => {}
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => warn!("Log retrieval error: {}", e),
            }

            state.lock().prune();
        }
    }
}
