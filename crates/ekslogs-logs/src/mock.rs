//! Scripted LogsApi used by the unit tests

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;

use ekslogs_aws::LogsApi;
use ekslogs_types::{EventPage, EventQuery, RawEvent};

#[derive(Default)]
struct MockGroup {
    streams: Vec<String>,
    events: Vec<RawEvent>,
}

/// In-memory log groups served page by page with offset tokens
#[derive(Default)]
pub struct MockLogs {
    groups: Mutex<Vec<(String, MockGroup)>>,
    failing_listings: HashSet<String>,
    failing_queries: HashSet<String>,
    /// Provider-side page cap, independent of the requested limit
    page_cap: Option<usize>,
    query_delay: Option<Duration>,
    queries: Mutex<Vec<EventQuery>>,
    listing_calls: Mutex<HashMap<String, usize>>,
}

impl MockLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group with streams listed most recent first
    pub fn with_group(self, name: &str, streams: &[&str]) -> Self {
        self.groups.lock().push((
            name.to_string(),
            MockGroup {
                streams: streams.iter().map(|s| s.to_string()).collect(),
                events: Vec::new(),
            },
        ));
        self
    }

    /// Add `count` well-formed events on `stream`, one millisecond apart from `start_ms`
    pub fn with_events(self, group: &str, stream: &str, start_ms: i64, count: usize) -> Self {
        for i in 0..count {
            self.push_event(
                group,
                RawEvent::new(start_ms + i as i64, stream, &format!("{} message {}", stream, i)),
            );
        }
        self
    }

    pub fn with_raw_event(self, group: &str, event: RawEvent) -> Self {
        self.push_event(group, event);
        self
    }

    pub fn fail_listing(mut self, group: &str) -> Self {
        self.failing_listings.insert(group.to_string());
        self
    }

    pub fn fail_query(mut self, group: &str) -> Self {
        self.failing_queries.insert(group.to_string());
        self
    }

    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    /// Append an event while the mock is in use
    pub fn push_event(&self, group: &str, event: RawEvent) {
        let mut groups = self.groups.lock();
        if let Some((_, g)) = groups.iter_mut().find(|(name, _)| name == group) {
            g.events.push(event);
        }
    }

    /// Add a stream while the mock is in use, as the newest in its group
    pub fn push_stream(&self, group: &str, stream: &str) {
        let mut groups = self.groups.lock();
        if let Some((_, g)) = groups.iter_mut().find(|(name, _)| name == group) {
            g.streams.insert(0, stream.to_string());
        }
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.lock().clone()
    }

    pub fn listing_calls(&self, group: &str) -> usize {
        self.listing_calls.lock().get(group).copied().unwrap_or(0)
    }
}

fn in_window(event: &RawEvent, query: &EventQuery) -> bool {
    let Some(ts) = event.timestamp else {
        return true;
    };
    query.start_time.is_none_or(|start| ts >= start) && query.end_time.is_none_or(|end| ts <= end)
}

fn on_streams(event: &RawEvent, query: &EventQuery) -> bool {
    match (&query.log_stream_names, &event.log_stream_name) {
        (Some(names), Some(stream)) => names.contains(stream),
        _ => true,
    }
}

#[async_trait]
impl LogsApi for MockLogs {
    async fn list_log_groups(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .groups
            .lock()
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    async fn list_streams(&self, log_group: &str) -> Result<Vec<String>> {
        *self
            .listing_calls
            .lock()
            .entry(log_group.to_string())
            .or_default() += 1;

        if self.failing_listings.contains(log_group) {
            bail!("AccessDeniedException: not allowed to list {}", log_group);
        }
        let groups = self.groups.lock();
        match groups.iter().find(|(name, _)| name == log_group) {
            Some((_, g)) => Ok(g.streams.clone()),
            None => bail!("ResourceNotFoundException: {}", log_group),
        }
    }

    async fn query_events(&self, query: &EventQuery) -> Result<EventPage> {
        self.queries.lock().push(query.clone());

        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_queries.contains(&query.log_group) {
            bail!("ThrottlingException: rate exceeded for {}", query.log_group);
        }

        let groups = self.groups.lock();
        let Some((_, group)) = groups.iter().find(|(name, _)| *name == query.log_group) else {
            bail!("ResourceNotFoundException: {}", query.log_group);
        };

        let matching: Vec<&RawEvent> = group
            .events
            .iter()
            .filter(|e| in_window(e, query) && on_streams(e, query))
            .collect();

        let offset: usize = query
            .next_token
            .as_deref()
            .map(str::parse::<usize>)
            .transpose()?
            .unwrap_or(0);
        let mut size = query.limit.max(0) as usize;
        if let Some(cap) = self.page_cap {
            size = size.min(cap);
        }
        let end = (offset + size).min(matching.len());

        Ok(EventPage {
            events: matching[offset.min(end)..end].iter().map(|e| (*e).clone()).collect(),
            next_token: (end < matching.len()).then(|| end.to_string()),
        })
    }
}
