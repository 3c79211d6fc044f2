//! The schema compiler: descriptor graph in, grammar + view factories out.
//!
//! Compilation is a single-threaded, single-pass build. Every dispatch
//! returns the grammar rule and its paired view factory together, so the two
//! tables can never drift apart. Cycle safety is the two-phase discipline:
//! a named shape's key is registered as started *before* its body is
//! compiled, and a re-entrant visit returns the key (and a deferred factory)
//! immediately.

use std::collections::HashSet;

use typed_yaml_grammar::{rules, Grammar, Rule, RuleKey};

use crate::descriptor::{
    ChoiceAlt, ChoiceDescriptor, HierarchyDef, ObjectDef, PropertyDef, TypeDef, TypeDescriptor,
    TypeSet,
};
use crate::error::SchemaError;
use crate::views::{Binding, BindingTarget, ObjectFactory, ViewFactory, ViewTable};

/// The named rule under which the `$ref` shape of resolvable objects is
/// registered.
const RESOLVABLE_RULE: &str = "$resolvable";

/// A fully compiled schema: the validation grammar and the parallel table
/// of view factories, both keyed by the same rule keys.
///
/// Immutable once built; safe to share for read-only use.
pub struct CompiledSchema {
    pub grammar: Grammar,
    pub(crate) views: ViewTable,
    pub root: RuleKey,
}

impl CompiledSchema {
    /// The view-factory table, for callers materializing by hand.
    pub fn views(&self) -> &ViewTable {
        &self.views
    }
}

/// Compile the named root shape of a descriptor set.
pub fn compile(types: &TypeSet, root: &str) -> Result<CompiledSchema, SchemaError> {
    let mut compiler = Compiler {
        types,
        grammar: Grammar::new(),
        views: ViewTable::new(),
        started: HashSet::new(),
    };

    let (rule, factory) = compiler.dispatch(&TypeDescriptor::Named(root.to_string()))?;
    let root_key = match rule {
        Rule::Named(key) => key,
        body => {
            // A resolvable root compiles to a first-of; give it a key of
            // its own so the grammar has a named entry point.
            let key = compiler.grammar.declare("$document");
            compiler.grammar.define(key, body)?;
            compiler.views.insert(key, factory);
            key
        }
    };
    compiler.grammar.set_root(root_key);

    Ok(CompiledSchema {
        grammar: compiler.grammar,
        views: compiler.views,
        root: root_key,
    })
}

struct Compiler<'t> {
    types: &'t TypeSet,
    grammar: Grammar,
    views: ViewTable,
    /// Keys whose compilation has started; the re-entrancy guard that makes
    /// self-referential shapes terminate.
    started: HashSet<RuleKey>,
}

impl<'t> Compiler<'t> {
    fn dispatch(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<(Rule, ViewFactory), SchemaError> {
        match descriptor {
            TypeDescriptor::String => Ok((rules::string(), ViewFactory::Str)),
            TypeDescriptor::Integer => Ok((rules::integer(), ViewFactory::Int)),
            TypeDescriptor::Float => Ok((rules::float(), ViewFactory::Float)),
            TypeDescriptor::Boolean => Ok((rules::boolean(), ViewFactory::Bool)),
            TypeDescriptor::Number => {
                let rule = self
                    .grammar
                    .first_of(vec![rules::integer(), rules::float()]);
                Ok((rule, ViewFactory::Number))
            }
            TypeDescriptor::AnyNode => Ok((rules::anything(), ViewFactory::Identity)),
            TypeDescriptor::Enum { name, values } => {
                if values.is_empty() {
                    return Err(SchemaError::EmptyEnum(name.clone()));
                }
                let alternatives = values.iter().map(|v| rules::literal(v.clone())).collect();
                Ok((self.grammar.first_of(alternatives), ViewFactory::Str))
            }
            TypeDescriptor::List(element) => {
                let (rule, factory) = self.dispatch(element)?;
                Ok((
                    rules::array(rule),
                    ViewFactory::List(Box::new(factory)),
                ))
            }
            TypeDescriptor::Map { key_pattern, value } => {
                let (rule, factory) = self.dispatch(value)?;
                let (property, regex) = match key_pattern {
                    Some(pattern) => (
                        rules::pattern_property(pattern, rule)?,
                        Some(rules::compile_key_pattern(pattern)?),
                    ),
                    None => (rules::catch_all_property(rule), None),
                };
                Ok((
                    rules::object(vec![property])?,
                    ViewFactory::Map {
                        pattern: regex,
                        value: Box::new(factory),
                    },
                ))
            }
            TypeDescriptor::Choice(choice) => self.compile_choice(choice),
            TypeDescriptor::Named(name) => self.compile_named(name),
        }
    }

    fn compile_named(&mut self, name: &str) -> Result<(Rule, ViewFactory), SchemaError> {
        let def = self
            .types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        match def {
            TypeDef::Object(object) => self.compile_object(object),
            TypeDef::Hierarchy(hierarchy) => self.compile_hierarchy(hierarchy),
        }
    }

    fn compile_object(&mut self, object: &ObjectDef) -> Result<(Rule, ViewFactory), SchemaError> {
        let key = self.grammar.declare(&object.name);
        if self.started.insert(key) {
            let properties = self.merged_properties(object)?;
            if properties.is_empty() {
                return Err(SchemaError::EmptyObject(object.name.clone()));
            }
            let discriminants = properties.iter().filter(|p| p.discriminant).count();
            if discriminants > 1 {
                return Err(SchemaError::DuplicateDiscriminant(object.name.clone()));
            }

            let mut descriptions = Vec::with_capacity(properties.len());
            let mut bindings = Vec::with_capacity(properties.len());
            for property in &properties {
                if property.pattern.is_some() && (property.mandatory || property.discriminant) {
                    return Err(SchemaError::PatternMarkerConflict {
                        name: object.name.clone(),
                        accessor: property.accessor.clone(),
                    });
                }
                let (rule, factory) = self.dispatch(&property.shape)?;
                match &property.pattern {
                    Some(pattern) => {
                        descriptions.push(rules::pattern_property(pattern, rule)?);
                        bindings.push(Binding {
                            accessor: property.accessor.clone(),
                            target: BindingTarget::Pattern {
                                regex: rules::compile_key_pattern(pattern)?,
                                factory,
                            },
                        });
                    }
                    None => {
                        let key_name = property.key_name().to_string();
                        let description = if property.discriminant {
                            rules::discriminant(key_name.clone(), rule)
                        } else if property.mandatory {
                            rules::mandatory_property(key_name.clone(), rule)
                        } else {
                            rules::property(key_name.clone(), rule)
                        };
                        descriptions.push(description);
                        bindings.push(Binding {
                            accessor: property.accessor.clone(),
                            target: BindingTarget::Key {
                                key: key_name,
                                factory,
                            },
                        });
                    }
                }
            }

            let body = rules::object(descriptions)?;
            self.grammar.define(key, body)?;
            self.views
                .insert(key, ViewFactory::Object(ObjectFactory::new(
                    object.name.clone(),
                    bindings,
                )));
        }

        if object.resolvable {
            let reference = self.resolvable_rule()?;
            let rule = self
                .grammar
                .first_of(vec![Rule::Named(reference), Rule::Named(key)]);
            Ok((rule, ViewFactory::Deferred(key)))
        } else {
            Ok((Rule::Named(key), ViewFactory::Deferred(key)))
        }
    }

    fn compile_hierarchy(
        &mut self,
        hierarchy: &HierarchyDef,
    ) -> Result<(Rule, ViewFactory), SchemaError> {
        let key = self.grammar.declare(&hierarchy.name);
        if !self.started.insert(key) {
            return Ok((Rule::Named(key), ViewFactory::Deferred(key)));
        }
        if hierarchy.variants.is_empty() {
            return Err(SchemaError::EmptyHierarchy(hierarchy.name.clone()));
        }

        let mut alternatives = Vec::with_capacity(hierarchy.variants.len());
        let mut factories = Vec::with_capacity(hierarchy.variants.len());
        for variant_name in &hierarchy.variants {
            let def = self
                .types
                .get(variant_name)
                .ok_or_else(|| SchemaError::UnknownType(variant_name.clone()))?;
            let TypeDef::Object(variant) = def else {
                return Err(SchemaError::BadVariant {
                    hierarchy: hierarchy.name.clone(),
                    variant: variant_name.clone(),
                });
            };
            if variant.resolvable {
                return Err(SchemaError::BadVariant {
                    hierarchy: hierarchy.name.clone(),
                    variant: variant_name.clone(),
                });
            }
            let (rule, _factory) = self.compile_object(variant)?;
            let Rule::Named(variant_key) = rule else {
                return Err(SchemaError::BadVariant {
                    hierarchy: hierarchy.name.clone(),
                    variant: variant_name.clone(),
                });
            };
            // Variants are schema composition, not semantic tags: a matched
            // node is decorated with the hierarchy's key, not the variant's.
            self.grammar.mark_transparent(variant_key);
            alternatives.push(Rule::Named(variant_key));
            factories.push(ViewFactory::Deferred(variant_key));
        }

        let choice = self.grammar.allocate_choice();
        let body = Rule::FirstOf {
            choice,
            alternatives,
        };
        self.grammar.define(key, body)?;
        self.views.insert(
            key,
            ViewFactory::Choice {
                choice,
                alternatives: factories,
            },
        );
        Ok((Rule::Named(key), ViewFactory::Deferred(key)))
    }

    fn compile_choice(
        &mut self,
        choice: &ChoiceDescriptor,
    ) -> Result<(Rule, ViewFactory), SchemaError> {
        if choice.alternatives.is_empty() {
            return Err(SchemaError::EmptyChoice);
        }

        // A boolean choice reduces to exactly one fixed value; it cannot mix
        // with strings or sub-types.
        if let [ChoiceAlt::Bool(value)] = choice.alternatives.as_slice() {
            return Ok((rules::bool_value(*value), ViewFactory::Bool));
        }
        let bools = choice
            .alternatives
            .iter()
            .filter(|a| matches!(a, ChoiceAlt::Bool(_)))
            .count();
        if bools > 1 {
            return Err(SchemaError::BadBooleanChoice);
        }
        if bools == 1 {
            return Err(SchemaError::MixedChoice);
        }

        let mut alternatives = Vec::with_capacity(choice.alternatives.len());
        let mut factories = Vec::with_capacity(choice.alternatives.len());
        for alternative in &choice.alternatives {
            let (rule, factory) = match alternative {
                ChoiceAlt::Str(text) => (rules::literal(text.clone()), ViewFactory::Str),
                ChoiceAlt::Bool(_) => continue, // excluded above
                ChoiceAlt::Type(TypeDescriptor::AnyNode) => {
                    return Err(SchemaError::ChoiceOnAnyNode);
                }
                ChoiceAlt::Type(descriptor) => self.dispatch(descriptor)?,
            };
            alternatives.push(rule);
            factories.push(factory);
        }

        let id = self.grammar.allocate_choice();
        Ok((
            Rule::FirstOf {
                choice: id,
                alternatives,
            },
            ViewFactory::Choice {
                choice: id,
                alternatives: factories,
            },
        ))
    }

    /// Gather every accessor of an object, merging inherited declarations.
    ///
    /// The most specific marking wins: a re-declared accessor keeps the
    /// union of mandatory/discriminant flags and the most derived shape.
    fn merged_properties(&self, object: &ObjectDef) -> Result<Vec<PropertyDef>, SchemaError> {
        let mut path = HashSet::new();
        let mut merged = Vec::new();
        self.collect_properties(object, &mut path, &mut merged)?;
        Ok(merged)
    }

    fn collect_properties(
        &self,
        object: &ObjectDef,
        path: &mut HashSet<String>,
        out: &mut Vec<PropertyDef>,
    ) -> Result<(), SchemaError> {
        if !path.insert(object.name.clone()) {
            return Err(SchemaError::InheritanceCycle(object.name.clone()));
        }
        for base_name in &object.extends {
            let base = self
                .types
                .get(base_name)
                .ok_or_else(|| SchemaError::UnknownType(base_name.clone()))?;
            let TypeDef::Object(base) = base else {
                return Err(SchemaError::ExpectedObject(base_name.clone()));
            };
            self.collect_properties(base, path, out)?;
        }
        for property in &object.properties {
            if let Some(existing) = out.iter_mut().find(|p| p.accessor == property.accessor) {
                *existing = merge_property(existing, property);
            } else {
                out.push(property.clone());
            }
        }
        path.remove(&object.name);
        Ok(())
    }

    fn resolvable_rule(&mut self) -> Result<RuleKey, SchemaError> {
        let key = self.grammar.declare(RESOLVABLE_RULE);
        if self.started.insert(key) {
            let body = rules::object(vec![rules::mandatory_property(
                "$ref",
                rules::string(),
            )])?;
            self.grammar.define(key, body)?;
            self.views.insert(key, ViewFactory::Identity);
        }
        Ok(key)
    }
}

fn merge_property(base: &PropertyDef, derived: &PropertyDef) -> PropertyDef {
    PropertyDef {
        accessor: derived.accessor.clone(),
        key: derived.key.clone().or_else(|| base.key.clone()),
        mandatory: base.mandatory || derived.mandatory,
        discriminant: base.discriminant || derived.discriminant,
        pattern: derived.pattern.clone().or_else(|| base.pattern.clone()),
        shape: derived.shape.clone(),
    }
}
