//! The validation walk: rules against nodes.

use std::collections::HashSet;

use thiserror::Error;
use typed_yaml_tree::{Document, Node, NodeKind};

use crate::context::{Context, Outcome};
use crate::grammar::Grammar;
use crate::rules::{ObjectRule, Rule};

/// Fatal conditions that make the walk itself impossible.
///
/// These are document-level contradictions or grammar misuse — ordinary
/// non-conformance is recorded in the [`Outcome`], never raised.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The same key appears twice in one mapping.
    #[error("Property \"{key}\" is already defined in this object (line {line})")]
    DuplicateProperty { key: String, line: usize },

    /// A named rule was visited before its body was defined.
    #[error("Rule \"{name}\" has no validation attached")]
    UndefinedRule { name: String },

    /// `validate` was called on a grammar with no root rule.
    #[error("Grammar has no root rule")]
    NoRootRule,
}

/// Validate a document against the grammar's root rule.
pub fn validate(grammar: &Grammar, doc: &Document) -> Result<Outcome, EngineError> {
    let root = grammar.root().ok_or(EngineError::NoRootRule)?;
    validate_rule(grammar, &Rule::Named(root), doc)
}

/// Validate a document's root node against an arbitrary rule.
pub fn validate_rule(grammar: &Grammar, rule: &Rule, doc: &Document) -> Result<Outcome, EngineError> {
    let mut ctx = Context::new();
    ctx.set_document(doc.id());
    visit(grammar, rule, doc.root(), &mut ctx)?;
    Ok(ctx.into_outcome())
}

/// What the node actually is, for failure messages: scalar text in quotes,
/// the structural kind otherwise.
fn describe_actual(node: Node<'_>) -> String {
    if node.is_scalar() {
        format!("\"{}\"", node.text())
    } else {
        node.kind().to_string()
    }
}

fn expect(
    ctx: &mut Context,
    node: Node<'_>,
    matched: bool,
    expectation: impl FnOnce() -> String,
) -> bool {
    if !matched {
        ctx.record_failure(
            node,
            format!(
                "Expected: {}, got: {}",
                expectation(),
                describe_actual(node)
            ),
            vec![],
        );
    }
    matched
}

fn visit(
    grammar: &Grammar,
    rule: &Rule,
    node: Node<'_>,
    ctx: &mut Context,
) -> Result<bool, EngineError> {
    use typed_yaml_tree::ScalarKind;

    match rule {
        Rule::Kind(kinds) => Ok(expect(ctx, node, kinds.contains(&node.kind()), || {
            kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(" or ")
        })),

        Rule::Integer => Ok(expect(ctx, node, node.is_token(ScalarKind::Integer), || {
            "INTEGER".to_string()
        })),

        Rule::Float => Ok(expect(ctx, node, node.is_token(ScalarKind::Float), || {
            "FLOAT".to_string()
        })),

        Rule::AnyString => Ok(expect(ctx, node, node.is_token(ScalarKind::String), || {
            "STRING".to_string()
        })),

        Rule::Boolean(expected) => {
            let is_bool = node.is_token(ScalarKind::BooleanTrue)
                || node.is_token(ScalarKind::BooleanFalse);
            let matched = match expected {
                None => is_bool,
                Some(value) => is_bool && node.bool_value() == *value,
            };
            Ok(expect(ctx, node, matched, || match expected {
                None => "BOOLEAN".to_string(),
                Some(value) => value.to_string(),
            }))
        }

        Rule::Literal(text) => Ok(expect(
            ctx,
            node,
            node.is_scalar() && node.text() == text,
            || format!("\"{text}\""),
        )),

        Rule::Anything => Ok(!node.is_missing()),

        Rule::Array(element) => {
            if !node.is_array() {
                ctx.record_failure(node, format!("Expected array, got: {}", node.kind()), vec![]);
                return Ok(false);
            }
            let mut valid = true;
            for child in node.elements() {
                valid &= visit(grammar, element, child, ctx)?;
            }
            Ok(valid)
        }

        Rule::Object(object) => visit_object(grammar, object, node, ctx),

        Rule::FirstOf {
            choice,
            alternatives,
        } => {
            let mut causes = Vec::new();
            for (index, alternative) in alternatives.iter().enumerate() {
                ctx.capture();
                let matched = visit(grammar, alternative, node, ctx)?;
                let probe = ctx.captured();
                if matched {
                    // The winner's own diagnostics are kept; earlier failed
                    // attempts are discarded.
                    ctx.keep(probe);
                    ctx.record_match(*choice, node.id(), index);
                    return Ok(true);
                }
                causes.extend(probe);
            }
            let expectations: Vec<String> =
                alternatives.iter().map(|a| grammar.describe(a)).collect();
            ctx.record_failure(
                node,
                format!("Expected one of [{}]", expectations.join(", ")),
                causes,
            );
            Ok(false)
        }

        Rule::Named(key) => {
            let Some(body) = grammar.body(*key) else {
                return Err(EngineError::UndefinedRule {
                    name: grammar.rule_name(*key).to_string(),
                });
            };
            let matched = visit(grammar, body, node, ctx)?;
            if matched && !grammar.is_transparent(*key) {
                node.decorate(Grammar::tag_of(*key));
            }
            Ok(matched)
        }
    }
}

fn visit_object(
    grammar: &Grammar,
    object: &ObjectRule,
    node: Node<'_>,
    ctx: &mut Context,
) -> Result<bool, EngineError> {
    if !node.is_object() {
        ctx.record_failure(node, format!("Expected object, got: {}", node.kind()), vec![]);
        return Ok(false);
    }

    let mut observed: HashSet<String> = HashSet::new();
    for property in node.children_of_kind(NodeKind::Property) {
        let key_node = property.key();
        let value_node = property.value();
        if key_node.is_missing() || value_node.is_missing() {
            // Not a complete property; nothing to validate.
            continue;
        }
        let key = key_node.text();
        if !observed.insert(key.to_string()) {
            return Err(EngineError::DuplicateProperty {
                key: key.to_string(),
                line: property.source().line,
            });
        }

        if let Some(description) = object.literal(key) {
            let matched = visit(grammar, &description.value, value_node, ctx)?;
            if !matched && description.discriminant {
                // A failing discriminant aborts the whole object; later
                // properties and the mandatory check stay unexamined, so the
                // report for this object is deliberately incomplete.
                return Ok(false);
            }
        } else {
            let mut matched = false;
            for description in object.patterns() {
                if description.matcher.matches(key) {
                    // First declared pattern wins; its result never fails
                    // the object.
                    visit(grammar, &description.value, value_node, ctx)?;
                    matched = true;
                    break;
                }
            }
            if !matched {
                ctx.record_warning(key_node, format!("Unexpected property: \"{key}\""), vec![]);
            }
        }
    }

    let missing: Vec<&str> = object
        .mandatory
        .iter()
        .filter(|key| !observed.contains(*key))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        ctx.record_failure(
            node,
            format!("Missing required properties: [{}]", missing.join(", ")),
            vec![],
        );
        return Ok(false);
    }

    Ok(true)
}
