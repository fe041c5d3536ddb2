//! Elasticsearch API access: client, query construction, and evaluators.

mod client;
pub mod health;
pub mod metric;
pub mod query;

pub use client::{ClientError, EsClient, TlsOptions};
pub use health::ClusterHealth;
pub use metric::{MetricResult, ThresholdPolicy};
pub use query::{build_search, Dialect, QuerySpec};
