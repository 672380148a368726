use anyhow::Result;
use async_trait::async_trait;

use ekslogs_types::{ClusterInfo, EventPage, EventQuery};

/// Cluster lookup
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Describe a cluster, `None` if it does not exist
    async fn describe_cluster(&self, name: &str) -> Result<Option<ClusterInfo>>;

    /// Names of all clusters visible in the region
    async fn list_clusters(&self) -> Result<Vec<String>>;
}

/// Log group, stream and event access
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// Log group names starting with `prefix`
    async fn list_log_groups(&self, prefix: &str) -> Result<Vec<String>>;

    /// Stream names in a group, most recently active first
    async fn list_streams(&self, log_group: &str) -> Result<Vec<String>>;

    /// Fetch one page of events
    async fn query_events(&self, query: &EventQuery) -> Result<EventPage>;
}
