//! Shared types for ekslogs
//!
//! This crate contains data structures used across multiple ekslogs crates.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Cluster Types
// ============================================================================

/// EKS cluster information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterInfo {
    pub name: String,
    pub status: String,
    pub version: Option<String>,
    /// Control plane log types with logging enabled (EKS naming)
    pub enabled_log_types: Vec<String>,
}

impl ClusterInfo {
    pub fn new(name: String, status: String) -> Self {
        Self {
            name,
            status,
            version: None,
            enabled_log_types: Vec::new(),
        }
    }
}

/// CloudWatch log group name prefix for a cluster's control plane logs
pub fn log_group_prefix(cluster: &str) -> String {
    format!("/aws/eks/{}/cluster", cluster)
}

// ============================================================================
// Provider Types
// ============================================================================

/// A raw event as returned by the provider. Any field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
    pub log_stream_name: Option<String>,
    pub message: Option<String>,
}

impl RawEvent {
    pub fn new(timestamp: i64, log_stream_name: &str, message: &str) -> Self {
        Self {
            timestamp: Some(timestamp),
            log_stream_name: Some(log_stream_name.to_string()),
            message: Some(message.to_string()),
        }
    }
}

/// One page request against a log group
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub log_group: String,
    /// Restrict to these streams (None = every stream in the group)
    pub log_stream_names: Option<Vec<String>>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub filter_pattern: Option<String>,
    pub limit: i32,
    pub next_token: Option<String>,
}

/// One page of events plus the continuation token, if any
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub next_token: Option<String>,
}

// ============================================================================
// Log Types
// ============================================================================

/// Control plane log type, derived from the stream name
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogType {
    Api,
    Audit,
    Authenticator,
    Kcm,
    Ccm,
    Scheduler,
}

impl LogType {
    pub const ALL: [LogType; 6] = [
        Self::Api,
        Self::Audit,
        Self::Authenticator,
        Self::Kcm,
        Self::Ccm,
        Self::Scheduler,
    ];

    /// Canonical short name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Audit => "audit",
            Self::Authenticator => "authenticator",
            Self::Kcm => "kcm",
            Self::Ccm => "ccm",
            Self::Scheduler => "scheduler",
        }
    }

    /// Component name, which is also the stream name prefix without the trailing dash
    pub fn component(&self) -> &'static str {
        match self {
            Self::Api => "kube-apiserver",
            Self::Audit => "kube-apiserver-audit",
            Self::Authenticator => "authenticator",
            Self::Kcm => "kube-controller-manager",
            Self::Ccm => "cloud-controller-manager",
            Self::Scheduler => "kube-scheduler",
        }
    }

    /// Accepted aliases besides the canonical name
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Api | Self::Audit => &[],
            Self::Authenticator => &["auth"],
            Self::Kcm => &[
                "kubeControllerManager",
                "kube-controller-manager",
                "controller",
            ],
            Self::Ccm => &[
                "cloudControllerManager",
                "cloud-controller-manager",
                "cloud",
            ],
            Self::Scheduler => &["sched"],
        }
    }

    /// Human readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Api => "API Server logs",
            Self::Audit => "Audit logs",
            Self::Authenticator => "Authentication logs",
            Self::Kcm => "Kube Controller Manager logs",
            Self::Ccm => "Cloud Controller Manager logs",
            Self::Scheduler => "Scheduler logs",
        }
    }

    /// Description listing the accepted names, e.g. "scheduler (sched)"
    pub fn description(&self) -> String {
        match self {
            Self::Api | Self::Audit => format!("{} ({})", self.as_str(), self.component()),
            Self::Authenticator => "authenticator (auth, authenticator)".to_string(),
            _ => format!("{} ({})", self.as_str(), self.aliases().join(", ")),
        }
    }

    /// Resolve a user supplied name or alias
    pub fn normalize(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == name || t.aliases().contains(&name))
    }

    /// Classify a stream name by its prefix
    pub fn from_stream_name(stream: &str) -> Option<Self> {
        // Audit first: its prefix also starts with "kube-apiserver-"
        [
            Self::Audit,
            Self::Api,
            Self::Authenticator,
            Self::Kcm,
            Self::Ccm,
            Self::Scheduler,
        ]
        .into_iter()
        .find(|t| {
            stream
                .strip_prefix(t.component())
                .is_some_and(|rest| rest.starts_with('-'))
        })
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join descriptions of the given types with ", "
pub fn describe_log_types<'a>(types: impl IntoIterator<Item = &'a LogType>) -> String {
    types
        .into_iter()
        .map(LogType::description)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Component name for a stream, "unknown" when unclassified
pub fn component_from_stream_name(stream: &str) -> &'static str {
    LogType::from_stream_name(stream)
        .map(|t| t.component())
        .unwrap_or("unknown")
}

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(rename = "warning")]
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Parse log level from common formats
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" | "trc" => Some(Self::Trace),
            "debug" | "dbg" => Some(Self::Debug),
            "info" | "inf" | "information" => Some(Self::Info),
            "warn" | "warning" | "wrn" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "fatal" | "panic" | "critical" | "crit" => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized log entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Detected level, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    /// Component derived from the stream name
    pub component: String,

    pub message: String,

    pub log_group: String,

    pub log_stream: String,
}

impl LogEntry {
    /// Log type of the source stream
    pub fn log_type(&self) -> Option<LogType> {
        LogType::from_stream_name(&self.log_stream)
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Window used when neither start nor end is given
pub const DEFAULT_LOOKBACK_HOURS: i64 = 1;

/// An immutable description of one retrieval
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetrievalRequest {
    cluster: String,
    log_types: Vec<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    filter_pattern: Option<String>,
    limit: usize,
}

impl RetrievalRequest {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            ..Default::default()
        }
    }

    /// Requested log types as typed by the user (aliases allowed, empty = all)
    pub fn with_log_types(mut self, log_types: Vec<String>) -> Self {
        self.log_types = log_types;
        self
    }

    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Combined filter pattern; an empty pattern means no filter
    pub fn with_filter_pattern(mut self, pattern: Option<String>) -> Self {
        self.filter_pattern = pattern.filter(|p| !p.is_empty());
        self
    }

    /// Maximum entries to deliver (0 = unlimited)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn log_types(&self) -> &[String] {
        &self.log_types
    }

    pub fn filter_pattern(&self) -> Option<&str> {
        self.filter_pattern.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Effective time window. With neither bound set this is the last hour up to `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match (self.start, self.end) {
            (None, None) => (Some(now - Duration::hours(DEFAULT_LOOKBACK_HOURS)), Some(now)),
            bounds => bounds,
        }
    }
}
