//! AWS clients for ekslogs
//!
//! This crate defines the collaborator interfaces the log engine depends on
//! and implements them on top of the EKS and CloudWatch Logs SDKs.

mod api;
mod client;

pub use api::{ClusterApi, LogsApi};
pub use client::{EksLogsClient, MAX_STREAMS_LISTED};

// Re-export types that are used in our public API
pub use ekslogs_types::{ClusterInfo, EventPage, EventQuery, RawEvent};
