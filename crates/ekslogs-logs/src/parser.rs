use chrono::DateTime;
use serde_json::Value;

use ekslogs_types::{LogEntry, LogLevel, RawEvent, component_from_stream_name};

/// Field names that commonly carry the level in JSON logs
const LEVEL_FIELDS: [&str; 5] = ["level", "lvl", "severity", "log_level", "Level"];

/// Turns raw provider events into log entries
pub struct LogParser;

impl LogParser {
    /// Build a LogEntry from a raw event.
    /// Returns `None` when the timestamp, stream or message is missing.
    pub fn parse_event(log_group: &str, event: RawEvent) -> Option<LogEntry> {
        let timestamp = DateTime::from_timestamp_millis(event.timestamp?)?;
        let log_stream = event.log_stream_name?;
        let message = event.message?;

        Some(LogEntry {
            timestamp,
            level: Self::extract_level(&message),
            component: component_from_stream_name(&log_stream).to_string(),
            message,
            log_group: log_group.to_string(),
            log_stream,
        })
    }

    /// Detect the level from a klog header or a JSON level field
    pub fn extract_level(message: &str) -> Option<LogLevel> {
        Self::extract_klog_level(message).or_else(|| Self::extract_json_level(message))
    }

    /// klog lines start with a severity letter followed by the date: `I0719 06:09:10.476002 ...`
    fn extract_klog_level(message: &str) -> Option<LogLevel> {
        let mut chars = message.chars();
        let severity = chars.next()?;
        if !chars.next()?.is_ascii_digit() {
            return None;
        }

        match severity {
            'I' => Some(LogLevel::Info),
            'W' => Some(LogLevel::Warn),
            'E' => Some(LogLevel::Error),
            'F' => Some(LogLevel::Fatal),
            _ => None,
        }
    }

    fn extract_json_level(message: &str) -> Option<LogLevel> {
        let trimmed = message.trim();
        if !trimmed.starts_with('{') {
            return None;
        }

        let value: Value = serde_json::from_str(trimmed).ok()?;
        let obj = value.as_object()?;

        LEVEL_FIELDS
            .iter()
            .filter_map(|field| obj.get(*field))
            .find_map(|value| value.as_str().and_then(LogLevel::from_str))
    }
}
