//! Composable validation rules and their constructors.
//!
//! Anonymous combinators (arrays, objects, property matchers) are plain
//! values built with the free functions below; named rules and first-of
//! alternatives go through [`Grammar`](crate::Grammar), which owns the rule
//! table and the choice identifiers.

use std::collections::HashMap;

use regex::Regex;
use typed_yaml_tree::NodeKind;

use crate::grammar::{ChoiceId, GrammarError, RuleKey};

/// A composable predicate over a document node.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Structural kind of the node must be one of the expected kinds.
    Kind(Vec<NodeKind>),

    /// Scalar with an integer token.
    Integer,

    /// Scalar with a float token.
    Float,

    /// Scalar with a string token.
    AnyString,

    /// Scalar with a boolean token, optionally with a fixed value.
    Boolean(Option<bool>),

    /// Any scalar whose literal text equals the expected text.
    Literal(String),

    /// Matches any present node, with no further structure.
    Anything,

    /// A sequence whose every element satisfies the element rule.
    Array(Box<Rule>),

    /// A mapping with declared properties.
    Object(ObjectRule),

    /// Ordered alternatives; the first that matches wins and is recorded.
    FirstOf {
        choice: ChoiceId,
        alternatives: Vec<Rule>,
    },

    /// Delegation to a named rule in the grammar table.
    Named(RuleKey),
}

/// How an object property matches candidate keys.
#[derive(Debug, Clone)]
pub enum KeyMatcher {
    /// Exact key text.
    Literal(String),

    /// Full-match regular expression over the key text.
    Pattern { raw: String, regex: Regex },

    /// Matches every key (the map catch-all).
    AnyKey,
}

impl KeyMatcher {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyMatcher::Literal(text) => text == key,
            KeyMatcher::Pattern { regex, .. } => regex.is_match(key),
            KeyMatcher::AnyKey => true,
        }
    }

    pub fn is_pattern(&self) -> bool {
        !matches!(self, KeyMatcher::Literal(_))
    }
}

/// One property description of an object rule.
///
/// A discriminant is implicitly mandatory, and its failure is fatal to the
/// enclosing object.
#[derive(Debug, Clone)]
pub struct PropertyRule {
    pub matcher: KeyMatcher,
    pub mandatory: bool,
    pub discriminant: bool,
    pub value: Rule,
}

/// The structure of an object: literal-keyed properties plus pattern
/// properties in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ObjectRule {
    pub(crate) literals: HashMap<String, PropertyRule>,
    pub(crate) patterns: Vec<PropertyRule>,
    /// Mandatory literal keys, in declaration order.
    pub(crate) mandatory: Vec<String>,
}

impl ObjectRule {
    /// Assemble an object rule from property descriptions.
    ///
    /// Declaring the same literal key twice is an error.
    pub fn new(properties: Vec<PropertyRule>) -> Result<Self, GrammarError> {
        let mut object = ObjectRule::default();
        for property in properties {
            object.add(property)?;
        }
        Ok(object)
    }

    fn add(&mut self, property: PropertyRule) -> Result<(), GrammarError> {
        match &property.matcher {
            KeyMatcher::Literal(key) => {
                let key = key.clone();
                if self.literals.contains_key(&key) {
                    return Err(GrammarError::DuplicateProperty(key));
                }
                if property.mandatory {
                    self.mandatory.push(key.clone());
                }
                self.literals.insert(key, property);
            }
            _ => self.patterns.push(property),
        }
        Ok(())
    }

    pub(crate) fn literal(&self, key: &str) -> Option<&PropertyRule> {
        self.literals.get(key)
    }

    pub(crate) fn patterns(&self) -> &[PropertyRule] {
        &self.patterns
    }
}

/// A scalar with a string token.
pub fn string() -> Rule {
    Rule::AnyString
}

/// A scalar with an integer token.
pub fn integer() -> Rule {
    Rule::Integer
}

/// A scalar with a float token.
pub fn float() -> Rule {
    Rule::Float
}

/// A scalar with a boolean token, either value.
pub fn boolean() -> Rule {
    Rule::Boolean(None)
}

/// A boolean scalar with a fixed value.
pub fn bool_value(value: bool) -> Rule {
    Rule::Boolean(Some(value))
}

/// Any scalar whose literal text equals `text` exactly.
pub fn literal(text: impl Into<String>) -> Rule {
    Rule::Literal(text.into())
}

/// Any present node: scalar, array or object, with no further structure.
pub fn anything() -> Rule {
    Rule::Anything
}

/// A node whose structural kind is one of `kinds`.
pub fn node_kind(kinds: Vec<NodeKind>) -> Rule {
    Rule::Kind(kinds)
}

/// A sequence of `element`.
pub fn array(element: Rule) -> Rule {
    Rule::Array(Box::new(element))
}

/// Any sequence.
pub fn any_array() -> Rule {
    array(anything())
}

/// An object with the supplied property descriptions.
pub fn object(properties: Vec<PropertyRule>) -> Result<Rule, GrammarError> {
    Ok(Rule::Object(ObjectRule::new(properties)?))
}

/// Any object, whatever its properties.
pub fn any_object() -> Rule {
    Rule::Object(ObjectRule {
        literals: HashMap::new(),
        patterns: vec![catch_all_property(anything())],
        mandatory: Vec::new(),
    })
}

/// An optional property with a literal key.
pub fn property(key: impl Into<String>, value: Rule) -> PropertyRule {
    PropertyRule {
        matcher: KeyMatcher::Literal(key.into()),
        mandatory: false,
        discriminant: false,
        value,
    }
}

/// A mandatory property with a literal key.
pub fn mandatory_property(key: impl Into<String>, value: Rule) -> PropertyRule {
    PropertyRule {
        matcher: KeyMatcher::Literal(key.into()),
        mandatory: true,
        discriminant: false,
        value,
    }
}

/// A discriminant property: mandatory, and fatal to the enclosing object
/// when its value does not conform.
pub fn discriminant(key: impl Into<String>, value: Rule) -> PropertyRule {
    PropertyRule {
        matcher: KeyMatcher::Literal(key.into()),
        mandatory: true,
        discriminant: true,
        value,
    }
}

/// Compile a key pattern into a full-match regular expression.
pub fn compile_key_pattern(pattern: &str) -> Result<Regex, GrammarError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| GrammarError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// A property matched by full regular-expression match against the key.
pub fn pattern_property(pattern: &str, value: Rule) -> Result<PropertyRule, GrammarError> {
    let regex = compile_key_pattern(pattern)?;
    Ok(PropertyRule {
        matcher: KeyMatcher::Pattern {
            raw: pattern.to_string(),
            regex,
        },
        mandatory: false,
        discriminant: false,
        value,
    })
}

/// A property matching every key: the map catch-all.
pub fn catch_all_property(value: Rule) -> PropertyRule {
    PropertyRule {
        matcher: KeyMatcher::AnyKey,
        mandatory: false,
        discriminant: false,
        value,
    }
}
