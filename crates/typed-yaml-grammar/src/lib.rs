//! # typed-yaml-grammar
//!
//! A PEG-like grammar and validation engine for YAML document trees.
//!
//! Grammars are built from composable [`Rule`]s — scalar and type terminals,
//! arrays, objects with literal/pattern/mandatory/discriminant properties,
//! ordered first-of alternatives, and named rules registered in a [`Grammar`]
//! table. Validation walks a [`typed_yaml_tree::Document`] and records
//! [`ValidationIssue`]s into a [`Context`]; non-conformance is data, never an
//! error. Only document-level contradictions (duplicate keys, rules with no
//! body) abort the walk with an [`EngineError`].
//!
//! Named rules decorate the nodes they accept with their own key, and
//! first-of rules record which alternative matched each node in the returned
//! [`Outcome`] — both are consumed downstream by the view materializer.
//!
//! ## Example
//!
//! ```rust
//! use typed_yaml_grammar::{rules, validate, Grammar};
//!
//! let mut grammar = Grammar::new();
//! let root = grammar.declare("config");
//! let body = rules::object(vec![rules::mandatory_property(
//!     "title",
//!     rules::string(),
//! )])
//! .unwrap();
//! grammar.define(root, body).unwrap();
//! grammar.set_root(root);
//!
//! let doc = typed_yaml_tree::parse("title: My Document").unwrap();
//! let outcome = validate(&grammar, &doc).unwrap();
//! assert!(outcome.accepted);
//! ```

mod context;
mod grammar;
mod issue;
pub mod rules;
mod validator;

pub use context::{ChoiceMatches, Context, Outcome};
pub use grammar::{ChoiceId, Grammar, GrammarError, RuleKey};
pub use issue::{Severity, ValidationIssue};
pub use rules::{KeyMatcher, ObjectRule, PropertyRule, Rule};
pub use validator::{validate, validate_rule, EngineError};
