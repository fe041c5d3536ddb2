//! Metric-query evaluation: hit counts, top-N breakdown, and thresholds.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::query::{QuerySpec, TOP_AGG_NAME};
use crate::status::{CheckStatus, Severity};

/// Warning/critical thresholds and comparison direction.
///
/// An unset threshold never fires. `invert` alerts when the count falls
/// below a threshold instead of above it; it is never inferred from the
/// threshold values themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdPolicy {
    pub warning: Option<u64>,
    pub critical: Option<u64>,
    pub invert: bool,
}

/// The search response did not carry the expected hit total.
#[derive(Debug, Error)]
#[error("missing hit count in search response")]
pub struct MissingHitCount;

/// Interpreted outcome of a metric query.
#[derive(Debug, Clone)]
pub struct MetricResult {
    pub hits: u64,
    /// `(term, doc_count)` pairs of the top-N aggregation, in response order.
    pub buckets: Vec<(String, u64)>,
    /// Field the breakdown was aggregated on.
    pub field: Option<String>,
}

impl MetricResult {
    /// Interpret a `_search` response.
    ///
    /// A missing hit total is an error the caller reports. A missing or
    /// malformed aggregation section is not: the breakdown is dropped and
    /// the hit count stands on its own.
    pub fn from_response(response: &Value, field: Option<&str>) -> Result<Self, MissingHitCount> {
        let hits = response["hits"]["total"]
            .as_u64()
            .ok_or(MissingHitCount)?;

        let buckets = response["aggregations"][TOP_AGG_NAME]["buckets"]
            .as_array()
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|bucket| {
                        Some((bucket_key(&bucket["key"])?, bucket["doc_count"].as_u64()?))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            hits,
            buckets,
            field: field.map(String::from),
        })
    }
}

/// Terms aggregation keys come back as strings for keyword fields and as
/// numbers or booleans for everything else.
fn bucket_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Compare the hit count against the policy and format the report.
pub fn evaluate(result: &MetricResult, policy: &ThresholdPolicy, spec: &QuerySpec) -> CheckStatus {
    let severity = threshold_severity(result.hits, policy);
    debug!(
        "query returned {} hits over {} -> {}",
        result.hits, spec.duration, severity
    );

    let mut message = format!(
        "\"{}\" returned {} (over {})",
        spec.query, result.hits, spec.duration
    );
    if let Some(field) = &result.field {
        for (key, doc_count) in &result.buckets {
            message.push_str(&format!("\n{} {}: has {} hits", field, key, doc_count));
        }
    }

    let perfdata = format!(
        "query_hits={};{};{}",
        result.hits,
        policy.warning.map(|w| w.to_string()).unwrap_or_default(),
        policy.critical.map(|c| c.to_string()).unwrap_or_default(),
    );

    CheckStatus::with_perfdata(severity, message, perfdata)
}

/// Critical is checked before warning; an unset threshold never fires.
fn threshold_severity(hits: u64, policy: &ThresholdPolicy) -> Severity {
    let breached = |threshold: Option<u64>| {
        threshold.is_some_and(|t| if policy.invert { hits < t } else { hits > t })
    };

    if breached(policy.critical) {
        Severity::Critical
    } else if breached(policy.warning) {
        Severity::Warning
    } else {
        Severity::Ok
    }
}
