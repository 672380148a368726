use std::fmt;

use thiserror::Error;

use ekslogs_types::{LogType, describe_log_types};

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors surfaced by retrieval and tailing.
///
/// Cancellation is never represented here: a cancelled call returns `Ok(())`.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// No log group exists for the cluster, usually because logging is disabled
    #[error(
        "no log groups found for cluster '{cluster}'. Please ensure:
  1. The cluster exists in the specified region
  2. Control plane logging is enabled for the cluster (check EKS console -> cluster -> Logging tab)
  3. You have the required permissions (logs:DescribeLogGroups, logs:FilterLogEvents, eks:DescribeCluster)
  4. Try using the -v flag for more detailed output"
    )]
    NotFound { cluster: String },

    /// None of the requested log types has a stream in the cluster's groups
    #[error(
        "no logs found for specified types: [{}]
Available log types for cluster '{cluster}': {}
Run 'ekslogs logtypes' for more information about available log types",
        requested.join(", "),
        describe_log_types(available)
    )]
    NoMatchingLogs {
        cluster: String,
        requested: Vec<String>,
        available: Vec<LogType>,
    },

    /// One or more groups failed; entries from the others were still delivered
    #[error("encountered errors during log retrieval: {}", join_failures(failures))]
    Partial { failures: Vec<GroupFailure> },

    /// A setup call against the provider failed
    #[error("failed to get log groups: {0:#}\nPlease check your AWS credentials and permissions")]
    Provider(#[source] anyhow::Error),
}

impl RetrievalError {
    /// Errors that should end a tail session rather than be retried next tick.
    /// Missing log types are retried, since their streams may appear later.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A failure confined to one log group
#[derive(Debug)]
pub struct GroupFailure {
    pub log_group: String,
    pub error: anyhow::Error,
}

impl GroupFailure {
    pub fn new(log_group: &str, error: anyhow::Error) -> Self {
        Self {
            log_group: log_group.to_string(),
            error,
        }
    }
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log group '{}': {:#}", self.log_group, self.error)
    }
}

fn join_failures(failures: &[GroupFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Invalid start or end time string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error(
        "failed to parse time '{0}': expected RFC3339 format (2006-01-02T15:04:05Z) or relative format (-1h, -15m, -30s, -2d)"
    )]
    InvalidFormat(String),

    #[error("invalid relative time format: {0} (expected format: -1h, -15m, -30s, -2d)")]
    InvalidRelative(String),
}
