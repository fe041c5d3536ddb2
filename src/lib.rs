//! Escheck - an Icinga/Nagios check for Elasticsearch clusters
//!
//! This library provides the shared types and modules for the check binary:
//! the severity model, query construction, and response evaluation.

pub mod elasticsearch;
pub mod status;

pub use status::{CheckStatus, Severity};
