//! The rule table: named rules keyed by stable, interned keys.

use std::collections::HashMap;

use thiserror::Error;
use typed_yaml_tree::{Node, TypeTag};

use crate::rules::Rule;

/// Stable key of a named rule inside a [`Grammar`].
///
/// Keys are interned per name: declaring the same name twice yields the same
/// key. They double as the decoration tag stamped onto accepted nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleKey(pub(crate) u32);

/// Identity of one first-of rule, used to record which alternative matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChoiceId(pub(crate) u32);

/// Errors raised while assembling a grammar. These are schema-definition
/// mistakes, not document problems.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// A named rule's body may be set exactly once.
    #[error("Rule \"{0}\" is already defined")]
    AlreadyDefined(String),

    /// The same literal key was declared twice on one object.
    #[error("Property \"{0}\" has already been declared")]
    DuplicateProperty(String),

    /// A pattern property carries an invalid regular expression.
    #[error("Invalid property pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

struct RuleDefinition {
    name: String,
    body: Option<Rule>,
    transparent: bool,
}

/// The named-rule table of a compiled grammar.
///
/// Built once, in a single pass, then immutable: validation only reads it.
#[derive(Default)]
pub struct Grammar {
    defs: Vec<RuleDefinition>,
    by_name: HashMap<String, RuleKey>,
    root: Option<RuleKey>,
    choices: u32,
}

impl Grammar {
    pub fn new() -> Self {
        Grammar::default()
    }

    /// Intern a rule name, creating an empty definition on first sight.
    pub fn declare(&mut self, name: &str) -> RuleKey {
        if let Some(&key) = self.by_name.get(name) {
            return key;
        }
        let key = RuleKey(self.defs.len() as u32);
        self.defs.push(RuleDefinition {
            name: name.to_string(),
            body: None,
            transparent: false,
        });
        self.by_name.insert(name.to_string(), key);
        key
    }

    /// Attach the inner validation of a named rule. Exactly once per rule.
    pub fn define(&mut self, key: RuleKey, body: Rule) -> Result<(), GrammarError> {
        let def = &mut self.defs[key.0 as usize];
        if def.body.is_some() {
            return Err(GrammarError::AlreadyDefined(def.name.clone()));
        }
        def.body = Some(body);
        Ok(())
    }

    /// Whether a named rule already has a body.
    pub fn is_defined(&self, key: RuleKey) -> bool {
        self.defs[key.0 as usize].body.is_some()
    }

    /// Mark a rule as transparent: matched nodes keep their original
    /// decoration instead of being stamped with this rule's key.
    pub fn mark_transparent(&mut self, key: RuleKey) {
        self.defs[key.0 as usize].transparent = true;
    }

    pub fn set_root(&mut self, key: RuleKey) {
        self.root = Some(key);
    }

    pub fn root(&self) -> Option<RuleKey> {
        self.root
    }

    pub fn key_of(&self, name: &str) -> Option<RuleKey> {
        self.by_name.get(name).copied()
    }

    pub fn rule_name(&self, key: RuleKey) -> &str {
        &self.defs[key.0 as usize].name
    }

    /// Build an ordered-alternatives rule, allocating its choice identity.
    pub fn first_of(&mut self, alternatives: Vec<Rule>) -> Rule {
        Rule::FirstOf {
            choice: self.allocate_choice(),
            alternatives,
        }
    }

    /// Allocate a fresh choice identity, for callers assembling
    /// [`Rule::FirstOf`] by hand.
    pub fn allocate_choice(&mut self) -> ChoiceId {
        let choice = ChoiceId(self.choices);
        self.choices += 1;
        choice
    }

    /// The decoration tag corresponding to a rule key.
    pub fn tag_of(key: RuleKey) -> TypeTag {
        TypeTag::new(key.0)
    }

    /// The rule key corresponding to a decoration tag.
    pub fn key_of_tag(tag: TypeTag) -> RuleKey {
        RuleKey(tag.raw())
    }

    /// The name of the rule a validated node was decorated with, if any.
    pub fn decorated_name(&self, node: Node<'_>) -> Option<&str> {
        node.decoration()
            .map(|tag| self.rule_name(Self::key_of_tag(tag)))
    }

    pub(crate) fn body(&self, key: RuleKey) -> Option<&Rule> {
        self.defs[key.0 as usize].body.as_ref()
    }

    pub(crate) fn is_transparent(&self, key: RuleKey) -> bool {
        self.defs[key.0 as usize].transparent
    }

    /// A short human-readable expectation for a rule, used in messages.
    pub fn describe(&self, rule: &Rule) -> String {
        match rule {
            Rule::Kind(kinds) => kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(" or "),
            Rule::Integer => "INTEGER".to_string(),
            Rule::Float => "FLOAT".to_string(),
            Rule::AnyString => "STRING".to_string(),
            Rule::Boolean(None) => "BOOLEAN".to_string(),
            Rule::Boolean(Some(value)) => value.to_string(),
            Rule::Literal(text) => format!("\"{text}\""),
            Rule::Anything => "ANYTHING".to_string(),
            Rule::Array(element) => format!("array of <{}>", self.describe(element)),
            Rule::Object(_) => "OBJECT".to_string(),
            Rule::FirstOf { alternatives, .. } => {
                let parts: Vec<String> = alternatives.iter().map(|a| self.describe(a)).collect();
                format!("one of [{}]", parts.join(", "))
            }
            Rule::Named(key) => self.rule_name(*key).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    #[test]
    fn test_declare_is_idempotent() {
        let mut grammar = Grammar::new();
        let a = grammar.declare("a");
        let b = grammar.declare("a");
        assert_eq!(a, b);
        assert_eq!(grammar.rule_name(a), "a");
    }

    #[test]
    fn test_redefinition_is_an_error() {
        let mut grammar = Grammar::new();
        let key = grammar.declare("a");
        grammar.define(key, rules::string()).unwrap();

        let result = grammar.define(key, rules::integer());
        assert!(matches!(result, Err(GrammarError::AlreadyDefined(name)) if name == "a"));
    }

    #[test]
    fn test_first_of_allocates_distinct_choices() {
        let mut grammar = Grammar::new();
        let a = grammar.first_of(vec![rules::string()]);
        let b = grammar.first_of(vec![rules::integer()]);
        let (Rule::FirstOf { choice: ca, .. }, Rule::FirstOf { choice: cb, .. }) = (a, b) else {
            panic!("Expected FirstOf rules");
        };
        assert_ne!(ca, cb);
    }

    #[test]
    fn test_describe() {
        let mut grammar = Grammar::new();
        let key = grammar.declare("schema");
        let alts = grammar.first_of(vec![rules::boolean(), rules::integer()]);

        assert_eq!(grammar.describe(&rules::string()), "STRING");
        assert_eq!(
            grammar.describe(&rules::array(rules::literal("on"))),
            "array of <\"on\">"
        );
        assert_eq!(grammar.describe(&alts), "one of [BOOLEAN, INTEGER]");
        assert_eq!(grammar.describe(&Rule::Named(key)), "schema");
    }
}
