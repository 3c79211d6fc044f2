//! Per-validation state: the diagnostic list, capture scopes, and the
//! record of first-of matches.

use std::collections::HashMap;

use typed_yaml_tree::{DocumentId, Node, NodeId};

use crate::grammar::ChoiceId;
use crate::issue::{Severity, ValidationIssue};

/// Which alternative each first-of rule matched, per node.
///
/// Keyed by `(choice, node)` because independent first-of rules can accept
/// the same node (a resolvable wrapper around a discriminated hierarchy, for
/// instance). Carried in the [`Outcome`] rather than stamped into a shared
/// side table, so the record lives exactly as long as the validation run —
/// and tagged with the validated document's identity, so it cannot be
/// replayed against another tree.
#[derive(Debug, Clone, Default)]
pub struct ChoiceMatches {
    document: Option<DocumentId>,
    map: HashMap<(ChoiceId, NodeId), usize>,
}

impl ChoiceMatches {
    /// The document these matches were recorded for.
    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    /// The alternative index recorded for `node` by the given first-of rule.
    pub fn matched(&self, choice: ChoiceId, node: NodeId) -> Option<usize> {
        self.map.get(&(choice, node)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn set_document(&mut self, document: DocumentId) {
        self.document = Some(document);
    }

    pub(crate) fn record(&mut self, choice: ChoiceId, node: NodeId, index: usize) {
        self.map.insert((choice, node), index);
    }
}

/// Diagnostic context threaded through a single validation run.
///
/// Nested rules (first-of) open a capture scope, probe their sub-rules, and
/// either discard or keep what was recorded — the outer diagnostic list is
/// never polluted by abandoned branches.
#[derive(Debug, Default)]
pub struct Context {
    issues: Vec<ValidationIssue>,
    marks: Vec<usize>,
    matches: ChoiceMatches,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// Record a fatal non-conformance at `node`.
    pub fn record_failure(
        &mut self,
        node: Node<'_>,
        message: impl Into<String>,
        causes: Vec<ValidationIssue>,
    ) {
        self.issues.push(ValidationIssue::new(
            Severity::Error,
            node,
            message.into(),
            causes,
        ));
    }

    /// Record a non-blocking observation at `node`.
    pub fn record_warning(
        &mut self,
        node: Node<'_>,
        message: impl Into<String>,
        causes: Vec<ValidationIssue>,
    ) {
        self.issues.push(ValidationIssue::new(
            Severity::Warning,
            node,
            message.into(),
            causes,
        ));
    }

    /// Open a capture scope.
    pub fn capture(&mut self) {
        self.marks.push(self.issues.len());
    }

    /// Close the innermost capture scope, draining and returning everything
    /// recorded since it was opened.
    pub fn captured(&mut self) -> Vec<ValidationIssue> {
        let mark = self.marks.pop().unwrap_or(0);
        self.issues.split_off(mark)
    }

    /// Re-record issues into the current scope.
    pub(crate) fn keep(&mut self, issues: Vec<ValidationIssue>) {
        self.issues.extend(issues);
    }

    pub(crate) fn set_document(&mut self, document: DocumentId) {
        self.matches.set_document(document);
    }

    pub(crate) fn record_match(&mut self, choice: ChoiceId, node: NodeId, index: usize) {
        self.matches.record(choice, node, index);
    }

    /// Everything recorded so far, in document-walk order.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub(crate) fn into_outcome(self) -> Outcome {
        let accepted = !self.issues.iter().any(ValidationIssue::is_error);
        Outcome {
            accepted,
            issues: self.issues,
            matches: self.matches,
        }
    }
}

/// Result of one validation run.
///
/// `accepted` is `true` when no failure was recorded; warnings never affect
/// it. `matches` feeds the view materializer's choice factories.
#[derive(Debug)]
pub struct Outcome {
    pub accepted: bool,
    pub issues: Vec<ValidationIssue>,
    pub matches: ChoiceMatches,
}

impl Outcome {
    /// Issues of a given severity.
    pub fn issues_of(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_scopes_nest() {
        let doc = typed_yaml_tree::parse("p1: v1").unwrap();
        let node = doc.root();

        let mut ctx = Context::new();
        ctx.record_warning(node, "outer", vec![]);
        ctx.capture();
        ctx.record_failure(node, "inner a", vec![]);
        ctx.capture();
        ctx.record_failure(node, "inner b", vec![]);
        let inner = ctx.captured();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].message, "inner b");

        let outer = ctx.captured();
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].message, "inner a");

        assert_eq!(ctx.issues().len(), 1);
        assert_eq!(ctx.issues()[0].message, "outer");
    }

    #[test]
    fn test_outcome_acceptance_ignores_warnings() {
        let doc = typed_yaml_tree::parse("p1: v1").unwrap();
        let node = doc.root();

        let mut ctx = Context::new();
        ctx.record_warning(node, "odd but fine", vec![]);
        assert!(ctx.into_outcome().accepted);

        let mut ctx = Context::new();
        ctx.record_failure(node, "broken", vec![]);
        assert!(!ctx.into_outcome().accepted);
    }
}
