//! Validation issues: data-level non-conformance reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_yaml_tree::{Node, SourceInfo};

/// Severity of a recorded issue.
///
/// Failures reject the document; warnings never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One recorded validation issue, anchored to a document node.
///
/// `causes` carries the sub-rule issues that explain a composite failure
/// (e.g. every failed alternative of a first-of).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,

    /// JSON pointer of the offending node.
    pub pointer: String,

    /// Source position of the offending node.
    pub source: SourceInfo,

    pub causes: Vec<ValidationIssue>,
}

impl ValidationIssue {
    pub(crate) fn new(
        severity: Severity,
        node: Node<'_>,
        message: String,
        causes: Vec<ValidationIssue>,
    ) -> Self {
        Self {
            severity,
            message,
            pointer: node.pointer(),
            source: node.source().clone(),
            causes,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {}",
            self.severity, self.source.line, self.source.col, self.message
        )
    }
}
