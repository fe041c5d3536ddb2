//! Plugin status model: severities, exit codes, and output formatting.
//!
//! The monitoring framework reads exactly one stdout line per invocation,
//! `<SEVERITY> : <message>[ | <perfdata>]`, and the process exit code.

use std::fmt;

/// Alert severity following the Icinga plugin return-code convention.
///
/// Ordered by escalation: `Ok < Warning < Critical`. `Unknown` sits above
/// all of them and marks an operational failure of the check itself rather
/// than a judgement about the monitored cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// Process exit code consumed by the monitoring framework.
    pub fn exit_code(&self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        };
        f.write_str(token)
    }
}

/// Outcome of a check: what to report and how to exit.
#[derive(Debug, Clone)]
pub struct CheckStatus {
    pub severity: Severity,
    pub message: String,
    /// `key=value[;warn;crit]` tokens, graphed by the monitoring framework.
    pub perfdata: Option<String>,
}

impl CheckStatus {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            perfdata: None,
        }
    }

    pub fn with_perfdata(
        severity: Severity,
        message: impl Into<String>,
        perfdata: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            perfdata: Some(perfdata.into()),
        }
    }

    /// Render the plugin output line.
    pub fn output_line(&self) -> String {
        match &self.perfdata {
            Some(perfdata) => format!("{} : {} | {}", self.severity, self.message, perfdata),
            None => format!("{} : {}", self.severity, self.message),
        }
    }

    /// Print the output line and terminate with the matching exit code.
    pub fn exit(self) -> ! {
        println!("{}", self.output_line());
        std::process::exit(self.severity.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_display_tokens() {
        assert_eq!(Severity::Ok.to_string(), "OK");
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
        assert_eq!(Severity::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_escalation_order() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Unknown);
    }

    #[test]
    fn test_output_line_without_perfdata() {
        let status = CheckStatus::new(Severity::Unknown, "something went wrong");
        assert_eq!(status.output_line(), "UNKNOWN : something went wrong");
    }

    #[test]
    fn test_output_line_with_perfdata() {
        let status = CheckStatus::with_perfdata(Severity::Ok, "all good", "query_hits=0;;");
        assert_eq!(status.output_line(), "OK : all good | query_hits=0;;");
    }
}
