//! View factories: the materialization half of a compiled schema.
//!
//! Factories are emitted in lock-step with grammar rules; every named rule
//! key maps to exactly one factory in the [`ViewTable`]. Forward and cyclic
//! references go through [`ViewFactory::Deferred`], which resolves through
//! the table at materialization time — never at registration time.

use std::collections::HashMap;

use regex::Regex;
use typed_yaml_grammar::{ChoiceId, RuleKey};

pub mod value;

/// A lazily-applied constructor turning a validated node into a typed view.
#[derive(Debug)]
pub enum ViewFactory {
    /// Extract the scalar text.
    Str,

    /// Best-effort parse of the scalar text as an integer.
    Int,

    /// Best-effort parse of the scalar text as a float.
    Float,

    /// Extract the boolean value.
    Bool,

    /// Integer when the token is an integer, float otherwise.
    Number,

    /// Keep the raw document node.
    Identity,

    /// A list wrapping the node's elements.
    List(Box<ViewFactory>),

    /// A map over the node's properties, optionally key-restricted.
    Map {
        pattern: Option<Regex>,
        value: Box<ViewFactory>,
    },

    /// An object with one binding per declared accessor.
    Object(ObjectFactory),

    /// Delegate to the alternative the grammar engine recorded for the node.
    Choice {
        choice: ChoiceId,
        alternatives: Vec<ViewFactory>,
    },

    /// Look the target factory up in the shared table at first use.
    Deferred(RuleKey),
}

/// The accessor table of one object shape.
#[derive(Debug)]
pub struct ObjectFactory {
    pub(crate) name: String,
    pub(crate) bindings: Vec<Binding>,
}

impl ObjectFactory {
    pub(crate) fn new(name: String, bindings: Vec<Binding>) -> Self {
        Self { name, bindings }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared accessor names, in declaration order.
    pub fn accessors(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.accessor.as_str())
    }

    pub(crate) fn binding(&self, accessor: &str) -> Option<(usize, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .find(|(_, b)| b.accessor == accessor)
    }

    /// Which pattern binding a document key routes to, mirroring the
    /// grammar's property routing: literal keys never route to patterns,
    /// and among patterns the first declared match wins.
    pub(crate) fn pattern_route(&self, key: &str) -> Option<usize> {
        for binding in &self.bindings {
            if let BindingTarget::Key { key: literal, .. } = &binding.target
                && literal == key
            {
                return None;
            }
        }
        for (index, binding) in self.bindings.iter().enumerate() {
            if let BindingTarget::Pattern { regex, .. } = &binding.target
                && regex.is_match(key)
            {
                return Some(index);
            }
        }
        None
    }
}

/// One accessor of an object factory.
#[derive(Debug)]
pub(crate) struct Binding {
    pub(crate) accessor: String,
    pub(crate) target: BindingTarget,
}

/// What an accessor reads from the underlying node.
#[derive(Debug)]
pub(crate) enum BindingTarget {
    /// One property, by document key.
    Key { key: String, factory: ViewFactory },

    /// Every property whose key full-matches the pattern, as a map.
    Pattern { regex: Regex, factory: ViewFactory },
}

/// The shared rule-key → view-factory table of a compiled schema.
#[derive(Debug, Default)]
pub struct ViewTable {
    by_key: HashMap<RuleKey, ViewFactory>,
}

impl ViewTable {
    pub fn new() -> Self {
        ViewTable::default()
    }

    pub(crate) fn insert(&mut self, key: RuleKey, factory: ViewFactory) {
        self.by_key.insert(key, factory);
    }

    pub fn get(&self, key: RuleKey) -> Option<&ViewFactory> {
        self.by_key.get(&key)
    }
}
