//! Log retrieval for ekslogs
//!
//! This crate provides filter pattern building, limit-aware concurrent
//! retrieval across log groups, and the deduplicating tail loop.

mod budget;
mod error;
mod fetch;
mod filter;
mod parser;
mod presets;
mod resolver;
mod seen;
mod tail;
mod time;

#[cfg(test)]
mod mock;

pub use budget::RetrievalBudget;
pub use error::{GroupFailure, Result, RetrievalError, TimeParseError};
pub use fetch::{MAX_PAGE_SIZE, Retriever};
pub use filter::{combine as combine_patterns, needs_quoting, quote_term};
pub use parser::LogParser;
pub use presets::{FilterPresets, PatternType, Preset};
pub use resolver::{MAX_STREAM_NAMES, StreamResolver, normalize_types};
pub use seen::{DEFAULT_SEEN_CAPACITY, DEFAULT_SEEN_RETENTION_SECS, SeenIndex, SeenKey};
pub use tail::{
    DEFAULT_TAIL_INTERVAL, DEFAULT_TICK_LIMIT, DEFAULT_WARMUP_SECS, TailOptions, TailState, Tailer,
};
pub use time::parse_time;

// Re-export types used in our public API
pub use ekslogs_types::{LogEntry, LogLevel, LogType, RetrievalRequest};
