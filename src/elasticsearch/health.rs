//! Cluster health model and evaluation.

use serde::Deserialize;

use crate::status::{CheckStatus, Severity};

/// Response of `GET /_cluster/health`, reduced to the fields the check reports.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterHealth {
    pub status: String,
    pub timed_out: bool,
    pub number_of_nodes: u64,
    pub number_of_data_nodes: u64,
    pub active_primary_shards: u64,
    pub active_shards: u64,
    pub relocating_shards: u64,
    pub initializing_shards: u64,
    pub unassigned_shards: u64,
}

/// Map the cluster status to a severity and format the report.
///
/// red maps to CRITICAL, yellow to WARNING, green to OK. A status outside
/// that set is reported as UNKNOWN so the scheduler still sees a result.
pub fn evaluate(health: &ClusterHealth) -> CheckStatus {
    let severity = match health.status.as_str() {
        "red" => Severity::Critical,
        "yellow" => Severity::Warning,
        "green" => Severity::Ok,
        _ => Severity::Unknown,
    };

    let message = format!(
        "Cluster: {}. Timed out: {}",
        health.status,
        // Capitalized form, kept for compatibility with existing log matchers.
        if health.timed_out { "True" } else { "False" }
    );

    let perfdata = format!(
        "nodes={} data_nodes={} active_primary_shards={} active_shards={} \
         relocating_shards={} initializing_shards={} unassigned_shards={}",
        health.number_of_nodes,
        health.number_of_data_nodes,
        health.active_primary_shards,
        health.active_shards,
        health.relocating_shards,
        health.initializing_shards,
        health.unassigned_shards,
    );

    CheckStatus::with_perfdata(severity, message, perfdata)
}
