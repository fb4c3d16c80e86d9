//! Core finding types.
//!
//! The analysis pass produces `Finding` values; all consumers (human
//! output, JSON output) read them.

use serde::{Deserialize, Serialize};

/// A finding produced by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule code (e.g. "SQL001").
    pub rule: String,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
    /// Where the issue manifests (the sink call).
    pub location: Location,
    /// The producer instruction that triggered the verdict, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

/// Severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Ambiguous case surfaced for human review.
    Info,
    /// Potential vulnerability that should be addressed.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Source code location. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Degraded value for findings whose call site carries no position.
    /// Reporting never fails on a missing span.
    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".into(),
            line: 0,
            column: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.file == "<unknown>"
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The producer instruction backing a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Instruction id within the analyzed function.
    pub instruction_id: u32,
    /// Short description of the producer (e.g. "string concatenation").
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [{}] {}", self.location, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_finding() -> Finding {
        Finding {
            rule: "SQL001".into(),
            severity: Severity::Warning,
            message: "query text may contain unvalidated input".into(),
            location: Location {
                file: "handler.go".into(),
                line: 42,
                column: 9,
            },
            evidence: Some(Evidence {
                instruction_id: 7,
                description: "string concatenation".into(),
                location: None,
            }),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Info.to_string(), "info");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn test_location_display() {
        let loc = Location {
            file: "main.go".into(),
            line: 10,
            column: 3,
        };
        assert_eq!(loc.to_string(), "main.go:10:3");
    }

    #[test]
    fn test_unknown_location() {
        let loc = Location::unknown();
        assert!(loc.is_unknown());
        assert_eq!(loc.to_string(), "<unknown>:0:0");
    }

    #[test]
    fn test_finding_display() {
        let f = sample_finding();
        assert_eq!(
            f.to_string(),
            "handler.go:42:9: [warning] query text may contain unvalidated input"
        );
    }

    #[test]
    fn test_finding_json_round_trip() {
        let f = sample_finding();
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        let back: Finding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_finding_without_evidence_omits_field() {
        let mut f = sample_finding();
        f.evidence = None;
        let json = serde_json::to_string(&f).unwrap();
        assert!(!json.contains("evidence"));
    }
}
