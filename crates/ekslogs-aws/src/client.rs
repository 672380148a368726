//! EKS and CloudWatch Logs client wrapper

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use aws_sdk_cloudwatchlogs::types::OrderBy;
use aws_sdk_eks as eks;
use aws_types::region::Region;
use tracing::debug;

use crate::api::{ClusterApi, LogsApi};
use ekslogs_types::{ClusterInfo, EventPage, EventQuery, RawEvent};

/// Region used when neither the caller nor the environment provides one
const DEFAULT_REGION: &str = "us-east-1";

/// Stop listing streams after this many; streams come back most recent first
pub const MAX_STREAMS_LISTED: usize = 250;

/// Client wrapper over the EKS and CloudWatch Logs SDKs
#[derive(Clone)]
pub struct EksLogsClient {
    logs: cloudwatchlogs::Client,
    eks: eks::Client,
    region: String,
}

impl EksLogsClient {
    /// Load AWS configuration and build the SDK clients.
    /// An explicit region wins over the environment and profile.
    pub async fn new(region: Option<String>) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(region.map(Region::new))
            .or_default_provider()
            .or_else(DEFAULT_REGION);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let region = config
            .region()
            .map(|r| r.to_string())
            .context("Failed to resolve an AWS region")?;

        Ok(Self {
            logs: cloudwatchlogs::Client::new(&config),
            eks: eks::Client::new(&config),
            region,
        })
    }

    /// The resolved region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Convert an SDK cluster to ClusterInfo
    fn cluster_to_info(cluster: eks::types::Cluster, fallback_name: &str) -> ClusterInfo {
        let name = cluster.name.unwrap_or_else(|| fallback_name.to_string());
        let status = cluster
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let mut info = ClusterInfo::new(name, status);
        info.version = cluster.version;

        if let Some(setups) = cluster.logging.and_then(|l| l.cluster_logging) {
            info.enabled_log_types = setups
                .into_iter()
                .filter(|setup| setup.enabled.unwrap_or(false))
                .flat_map(|setup| setup.types.unwrap_or_default())
                .map(|t| t.as_str().to_string())
                .collect();
        }

        info
    }
}

#[async_trait]
impl ClusterApi for EksLogsClient {
    async fn describe_cluster(&self, name: &str) -> Result<Option<ClusterInfo>> {
        match self.eks.describe_cluster().name(name).send().await {
            Ok(response) => Ok(response.cluster.map(|c| Self::cluster_to_info(c, name))),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to describe cluster '{}'", name))
            }
        }
    }

    async fn list_clusters(&self) -> Result<Vec<String>> {
        let mut paginator = self.eks.list_clusters().into_paginator().send();

        let mut clusters = Vec::new();
        while let Some(page) = paginator.next().await {
            let page = page.context("Failed to list clusters")?;
            clusters.extend(page.clusters.unwrap_or_default());
        }

        Ok(clusters)
    }
}

#[async_trait]
impl LogsApi for EksLogsClient {
    async fn list_log_groups(&self, prefix: &str) -> Result<Vec<String>> {
        let mut paginator = self
            .logs
            .describe_log_groups()
            .log_group_name_prefix(prefix)
            .into_paginator()
            .send();

        let mut log_groups = Vec::new();
        while let Some(page) = paginator.next().await {
            let page = page.context("Failed to list log groups")?;
            log_groups.extend(
                page.log_groups
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|g| g.log_group_name),
            );
        }

        Ok(log_groups)
    }

    async fn list_streams(&self, log_group: &str) -> Result<Vec<String>> {
        let mut paginator = self
            .logs
            .describe_log_streams()
            .log_group_name(log_group)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .into_paginator()
            .send();

        let mut streams = Vec::new();
        while let Some(page) = paginator.next().await {
            let page = page.with_context(|| {
                format!("Failed to list log streams for log group: {}", log_group)
            })?;
            streams.extend(
                page.log_streams
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| s.log_stream_name),
            );
            if streams.len() >= MAX_STREAMS_LISTED {
                streams.truncate(MAX_STREAMS_LISTED);
                break;
            }
        }

        debug!(log_group, count = streams.len(), "listed log streams");
        Ok(streams)
    }

    async fn query_events(&self, query: &EventQuery) -> Result<EventPage> {
        let response = self
            .logs
            .filter_log_events()
            .log_group_name(&query.log_group)
            .set_log_stream_names(query.log_stream_names.clone())
            .set_start_time(query.start_time)
            .set_end_time(query.end_time)
            .set_filter_pattern(query.filter_pattern.clone())
            .limit(query.limit)
            .set_next_token(query.next_token.clone())
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to query log events from log group: {}",
                    query.log_group
                )
            })?;

        let events = response
            .events
            .unwrap_or_default()
            .into_iter()
            .map(|event| RawEvent {
                timestamp: event.timestamp,
                log_stream_name: event.log_stream_name,
                message: event.message,
            })
            .collect();

        Ok(EventPage {
            events,
            next_token: response.next_token,
        })
    }
}
