use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use ekslogs_types::LogEntry;

/// Default soft cap on remembered entries
pub const DEFAULT_SEEN_CAPACITY: usize = 1000;

/// Default age, behind the watermark, after which entries may be forgotten
pub const DEFAULT_SEEN_RETENTION_SECS: i64 = 120;

/// Identity of a delivered entry
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeenKey {
    timestamp_ms: i64,
    log_stream: String,
    message: String,
}

impl SeenKey {
    pub fn of(entry: &LogEntry) -> Self {
        Self {
            timestamp_ms: entry.timestamp.timestamp_millis(),
            log_stream: entry.log_stream.clone(),
            message: entry.message.clone(),
        }
    }
}

/// Bounded record of entries already delivered in tail mode.
///
/// Pruning policy: once the index grows past `capacity`, entries older than
/// `retention` behind the watermark are dropped. If that still leaves it above
/// `capacity` (a burst of entries inside the retention window), the whole index
/// is cleared. After a clear, an entry re-fetched by an overlapping window can
/// be admitted once more if its timestamp equals the watermark.
#[derive(Debug)]
pub struct SeenIndex {
    entries: HashMap<SeenKey, DateTime<Utc>>,
    capacity: usize,
    retention: Duration,
    clears: usize,
}

impl SeenIndex {
    pub fn new(capacity: usize, retention: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(4096)),
            capacity,
            retention,
            clears: 0,
        }
    }

    pub fn contains(&self, key: &SeenKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: SeenKey, timestamp: DateTime<Utc>) {
        self.entries.insert(key, timestamp);
    }

    /// Enforce the size bound relative to the current watermark
    pub fn prune(&mut self, watermark: DateTime<Utc>) {
        if self.entries.len() <= self.capacity {
            return;
        }

        let cutoff = watermark - self.retention;
        self.entries.retain(|_, ts| *ts >= cutoff);

        if self.entries.len() > self.capacity {
            self.entries.clear();
            self.clears += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times the index was cleared wholesale
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl Default for SeenIndex {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEEN_CAPACITY,
            Duration::seconds(DEFAULT_SEEN_RETENTION_SECS),
        )
    }
}
