use std::collections::BTreeSet;

use anyhow::Result;
use futures::future::join_all;
use tracing::debug;

use ekslogs_aws::LogsApi;
use ekslogs_types::LogType;

use crate::error::GroupFailure;

/// FilterLogEvents accepts at most this many stream names per call
pub const MAX_STREAM_NAMES: usize = 100;

/// Resolve user supplied names and aliases; unknown names are dropped
pub fn normalize_types(requested: &[String]) -> BTreeSet<LogType> {
    requested
        .iter()
        .filter_map(|name| {
            let normalized = LogType::normalize(name);
            if normalized.is_none() {
                debug!(name = %name, "unknown log type");
            }
            normalized
        })
        .collect()
}

/// Finds log streams by component type
pub struct StreamResolver<'a> {
    logs: &'a dyn LogsApi,
}

impl<'a> StreamResolver<'a> {
    pub fn new(logs: &'a dyn LogsApi) -> Self {
        Self { logs }
    }

    /// Log types that have at least one stream in any of the groups, plus the
    /// groups whose streams could not be listed
    pub async fn available_types(
        &self,
        log_groups: &[String],
    ) -> (BTreeSet<LogType>, Vec<GroupFailure>) {
        let listings = join_all(log_groups.iter().map(|g| self.logs.list_streams(g))).await;

        let mut types = BTreeSet::new();
        let mut failures = Vec::new();
        for (group, listing) in log_groups.iter().zip(listings) {
            match listing {
                Ok(streams) => {
                    types.extend(streams.iter().filter_map(|s| LogType::from_stream_name(s)))
                }
                Err(e) => {
                    debug!(log_group = %group, error = %e, "failed to list log streams");
                    failures.push(GroupFailure::new(group, e));
                }
            }
        }
        (types, failures)
    }

    /// Streams in `log_group` whose type is in `types`, most recently active first
    pub async fn streams_for_types(
        &self,
        log_group: &str,
        types: &BTreeSet<LogType>,
    ) -> Result<Vec<String>> {
        let streams: Vec<String> = self
            .logs
            .list_streams(log_group)
            .await?
            .into_iter()
            .filter(|s| LogType::from_stream_name(s).is_some_and(|t| types.contains(&t)))
            .take(MAX_STREAM_NAMES)
            .collect();

        debug!(log_group, count = streams.len(), "resolved matching streams");
        Ok(streams)
    }
}
