//! Concurrent, paginated, limit-aware retrieval across a cluster's log groups.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use ekslogs_aws::LogsApi;
use ekslogs_types::{EventQuery, LogEntry, LogType, RetrievalRequest, log_group_prefix};

use crate::budget::RetrievalBudget;
use crate::error::{GroupFailure, Result, RetrievalError};
use crate::parser::LogParser;
use crate::resolver::{StreamResolver, normalize_types};

/// Upper bound on events requested per page
pub const MAX_PAGE_SIZE: usize = 1000;

/// Which streams each group task queries
#[derive(Clone, Debug, PartialEq, Eq)]
enum StreamPlan {
    /// Every stream in the group
    All,
    /// Only streams of these types
    Types(BTreeSet<LogType>),
}

/// Per-retrieval state shared by the group tasks
struct Shared<'a, F> {
    template: EventQuery,
    plan: StreamPlan,
    budget: RetrievalBudget,
    /// Child of the caller's token; also cancelled when the budget runs out
    stop: CancellationToken,
    sink: &'a F,
}

/// Fans a retrieval out over every log group of a cluster
#[derive(Clone)]
pub struct Retriever {
    logs: Arc<dyn LogsApi>,
}

impl Retriever {
    pub fn new(logs: Arc<dyn LogsApi>) -> Self {
        Self { logs }
    }

    /// Log groups for a cluster, `NotFound` if there are none
    pub async fn log_groups(&self, cluster: &str) -> Result<Vec<String>> {
        let groups = self
            .logs
            .list_log_groups(&log_group_prefix(cluster))
            .await
            .map_err(RetrievalError::Provider)?;

        if groups.is_empty() {
            return Err(RetrievalError::NotFound {
                cluster: cluster.to_string(),
            });
        }
        debug!(cluster, ?groups, "found log groups");
        Ok(groups)
    }

    /// Run one retrieval, handing every entry to `sink`.
    ///
    /// Entries already delivered stay delivered when some groups fail; the
    /// failures come back together as `RetrievalError::Partial`. Cancelling
    /// `cancel` stops the retrieval and returns `Ok(())`.
    pub async fn retrieve<F>(
        &self,
        request: &RetrievalRequest,
        cancel: &CancellationToken,
        sink: F,
    ) -> Result<()>
    where
        F: Fn(LogEntry) + Sync,
    {
        let setup = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            setup = self.prepare(request) => setup?,
        };
        let (groups, plan) = setup;

        let (start, end) = request.window(Utc::now());
        let shared = Shared {
            template: EventQuery {
                start_time: start.map(|t| t.timestamp_millis()),
                end_time: end.map(|t| t.timestamp_millis()),
                filter_pattern: request.filter_pattern().map(str::to_string),
                ..Default::default()
            },
            plan,
            budget: RetrievalBudget::new(request.limit()),
            stop: cancel.child_token(),
            sink: &sink,
        };

        debug!(
            cluster = request.cluster(),
            ?start,
            ?end,
            limit = request.limit(),
            "retrieving logs"
        );

        let results = join_all(groups.iter().map(|g| self.fetch_group(g, &shared))).await;
        debug!(delivered = shared.budget.consumed(), "retrieval finished");

        if cancel.is_cancelled() {
            return Ok(());
        }

        let failures: Vec<GroupFailure> = results.into_iter().filter_map(|r| r.err()).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RetrievalError::Partial { failures })
        }
    }

    /// Resolve groups and, when types were requested, check that at least one
    /// of them exists in the cluster. Listing failures that leave no usable
    /// type come back as `Partial`.
    async fn prepare(&self, request: &RetrievalRequest) -> Result<(Vec<String>, StreamPlan)> {
        let groups = self.log_groups(request.cluster()).await?;

        if request.log_types().is_empty() {
            return Ok((groups, StreamPlan::All));
        }

        let requested = normalize_types(request.log_types());
        let (available, failures) = StreamResolver::new(self.logs.as_ref())
            .available_types(&groups)
            .await;
        let valid: BTreeSet<LogType> = requested.intersection(&available).copied().collect();

        // Types may live in the groups that could not be listed
        if valid.is_empty() && !failures.is_empty() {
            return Err(RetrievalError::Partial { failures });
        }
        if valid.is_empty() {
            return Err(RetrievalError::NoMatchingLogs {
                cluster: request.cluster().to_string(),
                requested: request.log_types().to_vec(),
                available: available.into_iter().collect(),
            });
        }

        debug!(?valid, "filtering by log types");
        Ok((groups, StreamPlan::Types(valid)))
    }

    /// Page through one group until the token runs out, the budget is spent
    /// or the retrieval is stopped
    async fn fetch_group<F>(
        &self,
        log_group: &str,
        shared: &Shared<'_, F>,
    ) -> std::result::Result<(), GroupFailure>
    where
        F: Fn(LogEntry) + Sync,
    {
        let log_stream_names = match &shared.plan {
            StreamPlan::All => None,
            StreamPlan::Types(types) => {
                let resolver = StreamResolver::new(self.logs.as_ref());
                let streams = tokio::select! {
                    biased;
                    _ = shared.stop.cancelled() => return Ok(()),
                    streams = resolver.streams_for_types(log_group, types) => {
                        streams.map_err(|e| GroupFailure::new(log_group, e))?
                    }
                };

                if streams.is_empty() {
                    debug!(log_group, "no matching streams, skipping group");
                    return Ok(());
                }
                Some(streams)
            }
        };

        let mut query = EventQuery {
            log_group: log_group.to_string(),
            log_stream_names,
            ..shared.template.clone()
        };
        let mut page_count = 0;

        loop {
            if shared.stop.is_cancelled() {
                return Ok(());
            }
            let Some(page_size) = shared.budget.page_size(MAX_PAGE_SIZE) else {
                shared.stop.cancel();
                return Ok(());
            };
            query.limit = page_size as i32;
            page_count += 1;

            let page = tokio::select! {
                biased;
                _ = shared.stop.cancelled() => return Ok(()),
                page = self.logs.query_events(&query) => {
                    page.map_err(|e| GroupFailure::new(log_group, e))?
                }
            };

            debug!(
                log_group,
                page = page_count,
                events = page.events.len(),
                has_next_token = page.next_token.is_some(),
                "fetched page"
            );

            for event in page.events {
                let Some(entry) = LogParser::parse_event(log_group, event) else {
                    continue;
                };
                if !shared.budget.try_reserve() {
                    shared.stop.cancel();
                    return Ok(());
                }
                (shared.sink)(entry);
            }

            if shared.budget.is_exhausted() {
                shared.stop.cancel();
                return Ok(());
            }

            match page.next_token {
                Some(token) => query.next_token = Some(token),
                None => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLogs;
    use ekslogs_types::RawEvent;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::time::Duration;

    const API: &str = "kube-apiserver-1";
    const SCHED: &str = "kube-scheduler-1";

    fn group(n: usize) -> String {
        format!("/aws/eks/prod/cluster{}", n)
    }

    /// Events an hour-wide default window will include
    fn recent_ms() -> i64 {
        (Utc::now() - chrono::Duration::minutes(30)).timestamp_millis()
    }

    fn three_groups(events_per_group: usize) -> MockLogs {
        (0..3).fold(MockLogs::new(), |mock, n| {
            mock.with_group(&group(n), &[API])
                .with_events(&group(n), API, recent_ms(), events_per_group)
        })
    }

    async fn collect(
        logs: Arc<MockLogs>,
        request: &RetrievalRequest,
    ) -> (Vec<LogEntry>, Result<()>) {
        let retriever = Retriever::new(logs);
        let delivered = Mutex::new(Vec::new());
        let result = retriever
            .retrieve(request, &CancellationToken::new(), |e| delivered.lock().push(e))
            .await;
        (delivered.into_inner(), result)
    }

    #[tokio::test]
    async fn test_limit_is_never_exceeded() {
        let logs = Arc::new(three_groups(700).with_page_cap(50));
        let request = RetrievalRequest::new("prod").with_limit(1000);
        let (delivered, result) = collect(logs, &request).await;
        result.unwrap();
        assert_eq!(delivered.len(), 1000);
    }

    #[tokio::test]
    async fn test_limit_with_interleaved_groups() {
        let logs = Arc::new(
            three_groups(100)
                .with_page_cap(7)
                .with_query_delay(Duration::from_millis(1)),
        );
        let request = RetrievalRequest::new("prod").with_limit(50);
        let (delivered, result) = collect(logs, &request).await;
        result.unwrap();
        assert_eq!(delivered.len(), 50);
    }

    #[tokio::test]
    async fn test_limit_above_available_delivers_everything() {
        let logs = Arc::new(three_groups(10));
        let request = RetrievalRequest::new("prod").with_limit(1000);
        let (delivered, result) = collect(logs, &request).await;
        result.unwrap();
        assert_eq!(delivered.len(), 30);
    }

    #[tokio::test]
    async fn test_unlimited_delivers_each_entry_once() {
        let logs = Arc::new(three_groups(2500));
        let request = RetrievalRequest::new("prod");
        let (delivered, result) = collect(Arc::clone(&logs), &request).await;
        result.unwrap();

        assert_eq!(delivered.len(), 7500);
        let unique: HashSet<_> = delivered
            .iter()
            .map(|e| (e.log_group.clone(), e.message.clone()))
            .collect();
        assert_eq!(unique.len(), 7500);
        // 3 pages of at most 1000 per group
        assert!(logs.queries().iter().all(|q| q.limit == MAX_PAGE_SIZE as i32));
        assert_eq!(logs.queries().len(), 9);
    }

    #[tokio::test]
    async fn test_page_size_follows_remaining_budget() {
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[API])
                .with_events(&group(0), API, recent_ms(), 100)
                .with_page_cap(20),
        );
        let request = RetrievalRequest::new("prod").with_limit(30);
        let (delivered, result) = collect(Arc::clone(&logs), &request).await;
        result.unwrap();

        assert_eq!(delivered.len(), 30);
        let limits: Vec<i32> = logs.queries().iter().map(|q| q.limit).collect();
        assert_eq!(limits, vec![30, 10]);
    }

    #[tokio::test]
    async fn test_order_within_group_is_preserved() {
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[API])
                .with_events(&group(0), API, recent_ms(), 25)
                .with_page_cap(4),
        );
        let (delivered, result) = collect(logs, &RetrievalRequest::new("prod")).await;
        result.unwrap();

        let messages: Vec<_> = delivered.iter().map(|e| e.message.clone()).collect();
        let expected: Vec<_> = (0..25).map(|i| format!("{} message {}", API, i)).collect();
        assert_eq!(messages, expected);
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let logs = Arc::new(three_groups(40).fail_query(&group(1)).with_page_cap(15));
        let (delivered, result) = collect(logs, &RetrievalRequest::new("prod")).await;

        assert_eq!(delivered.len(), 80);
        assert!(delivered.iter().all(|e| e.log_group != group(1)));
        match result {
            Err(RetrievalError::Partial { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].log_group, group(1));
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_log_groups_is_not_found() {
        let logs = Arc::new(MockLogs::new().with_group("/aws/eks/other/cluster", &[API]));
        let (delivered, result) = collect(logs, &RetrievalRequest::new("prod")).await;
        assert!(delivered.is_empty());
        assert!(matches!(result, Err(RetrievalError::NotFound { cluster }) if cluster == "prod"));
    }

    #[tokio::test]
    async fn test_unavailable_types_report_available_ones() {
        let logs = Arc::new(three_groups(5));
        let request = RetrievalRequest::new("prod").with_log_types(vec!["sched".into()]);
        let (delivered, result) = collect(logs, &request).await;

        assert!(delivered.is_empty());
        match result {
            Err(RetrievalError::NoMatchingLogs {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, vec!["sched".to_string()]);
                assert_eq!(available, vec![LogType::Api]);
            }
            other => panic!("expected NoMatchingLogs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_type_filter_restricts_streams() {
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[SCHED, API])
                .with_events(&group(0), API, recent_ms(), 5)
                .with_events(&group(0), SCHED, recent_ms(), 3)
                .with_group(&group(1), &[API])
                .with_events(&group(1), API, recent_ms(), 5),
        );
        let request = RetrievalRequest::new("prod").with_log_types(vec!["scheduler".into()]);
        let (delivered, result) = collect(Arc::clone(&logs), &request).await;
        result.unwrap();

        assert_eq!(delivered.len(), 3);
        assert!(delivered.iter().all(|e| e.component == "kube-scheduler"));
        // Group 1 has no scheduler streams and is never queried
        let queries = logs.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].log_stream_names, Some(vec![SCHED.to_string()]));
        // Streams are listed once to validate types and once to pick streams
        assert_eq!(logs.listing_calls(&group(0)), 2);
        assert_eq!(logs.listing_calls(&group(1)), 2);
    }

    #[tokio::test]
    async fn test_stream_listing_failure_is_a_group_warning() {
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[API])
                .with_events(&group(0), API, recent_ms(), 5)
                .with_group(&group(1), &[API])
                .with_events(&group(1), API, recent_ms(), 5)
                .fail_listing(&group(1)),
        );
        let request = RetrievalRequest::new("prod").with_log_types(vec!["api".into()]);
        let (delivered, result) = collect(logs, &request).await;

        assert_eq!(delivered.len(), 5);
        assert!(matches!(result, Err(RetrievalError::Partial { failures }) if failures.len() == 1));
    }

    #[tokio::test]
    async fn test_listing_failure_in_every_group_is_partial() {
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[API])
                .with_events(&group(0), API, recent_ms(), 5)
                .with_group(&group(1), &[API])
                .fail_listing(&group(0))
                .fail_listing(&group(1)),
        );
        let request = RetrievalRequest::new("prod").with_log_types(vec!["api".into()]);
        let (delivered, result) = collect(Arc::clone(&logs), &request).await;

        assert!(delivered.is_empty());
        match result {
            Err(RetrievalError::Partial { failures }) => {
                let mut groups: Vec<_> = failures.into_iter().map(|f| f.log_group).collect();
                groups.sort();
                assert_eq!(groups, vec![group(0), group(1)]);
            }
            other => panic!("expected Partial, got {:?}", other),
        }
        assert!(logs.queries().is_empty());
        assert_eq!(logs.listing_calls(&group(0)), 1);
        assert_eq!(logs.listing_calls(&group(1)), 1);
    }

    #[tokio::test]
    async fn test_type_missing_from_listed_groups_with_unlisted_group_is_partial() {
        // The requested type could be in the group that failed to list
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[API])
                .with_group(&group(1), &[SCHED])
                .fail_listing(&group(1)),
        );
        let request = RetrievalRequest::new("prod").with_log_types(vec!["sched".into()]);
        let (_, result) = collect(logs, &request).await;

        assert!(
            matches!(&result, Err(RetrievalError::Partial { failures }) if failures.len() == 1 && failures[0].log_group == group(1)),
            "got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_malformed_events_do_not_count() {
        let mut malformed = RawEvent::new(recent_ms(), API, "no stream");
        malformed.log_stream_name = None;
        let logs = Arc::new(
            MockLogs::new()
                .with_group(&group(0), &[API])
                .with_raw_event(&group(0), malformed.clone())
                .with_raw_event(&group(0), malformed)
                .with_events(&group(0), API, recent_ms(), 3),
        );
        let request = RetrievalRequest::new("prod").with_limit(2);
        let (delivered, result) = collect(logs, &request).await;
        result.unwrap();
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|e| e.log_stream == API));
    }

    #[tokio::test]
    async fn test_filter_and_window_forwarded() {
        let logs = Arc::new(three_groups(1));
        let start = Utc::now() - chrono::Duration::hours(2);
        let request = RetrievalRequest::new("prod")
            .with_window(Some(start), None)
            .with_filter_pattern(Some("\"error\"".to_string()));
        let (_, result) = collect(Arc::clone(&logs), &request).await;
        result.unwrap();

        for query in logs.queries() {
            assert_eq!(query.filter_pattern.as_deref(), Some("\"error\""));
            assert_eq!(query.start_time, Some(start.timestamp_millis()));
            assert_eq!(query.end_time, None);
            assert_eq!(query.log_stream_names, None);
        }
    }

    #[tokio::test]
    async fn test_budget_exhaustion_stops_siblings() {
        let logs = Arc::new(three_groups(5000).with_page_cap(10));
        let request = RetrievalRequest::new("prod").with_limit(10);
        let (delivered, result) = collect(Arc::clone(&logs), &request).await;
        result.unwrap();

        assert_eq!(delivered.len(), 10);
        assert!(logs.queries().len() <= 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let logs = Arc::new(three_groups(10));
        let retriever = Retriever::new(logs);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let delivered = Mutex::new(Vec::new());
        let result = retriever
            .retrieve(&RetrievalRequest::new("prod"), &cancel, |e| {
                delivered.lock().push(e)
            })
            .await;
        assert!(result.is_ok());
        assert!(delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_mid_retrieval_is_clean() {
        let logs = Arc::new(
            three_groups(1000)
                .with_page_cap(10)
                .with_query_delay(Duration::from_millis(20))
                .fail_query(&group(2)),
        );
        let retriever = Retriever::new(logs);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(70)).await;
            trigger.cancel();
        });

        let delivered = Mutex::new(0usize);
        let result = retriever
            .retrieve(&RetrievalRequest::new("prod"), &cancel, |_| {
                *delivered.lock() += 1
            })
            .await;

        assert!(result.is_ok());
        assert!(*delivered.lock() < 2000);
    }
}
