//! Explicit type descriptors: the shapes callers want their data in.
//!
//! Descriptors form a graph that may be cyclic; cycles go through names
//! registered in a [`TypeSet`] (a self-referential shape references itself
//! with [`named`]). Names are the stable identity the compiler keys rules
//! and view factories on.

use std::collections::HashMap;

/// Shape specification for one value.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// A string scalar.
    String,

    /// An integer scalar.
    Integer,

    /// A float scalar.
    Float,

    /// A boolean scalar.
    Boolean,

    /// An integer-or-float scalar.
    Number,

    /// Any node, kept as an untyped document node — the escape hatch for
    /// shapes the schema does not constrain.
    AnyNode,

    /// A closed set of literal names.
    Enum { name: String, values: Vec<String> },

    /// A sequence of one element shape.
    List(Box<TypeDescriptor>),

    /// A mapping of string keys to one value shape, optionally restricting
    /// keys with a full-match pattern.
    Map {
        key_pattern: Option<String>,
        value: Box<TypeDescriptor>,
    },

    /// A value restricted to an explicit enumeration of alternatives.
    Choice(ChoiceDescriptor),

    /// A reference to a named definition in the [`TypeSet`].
    Named(String),
}

/// The alternatives of a choice-restricted value.
#[derive(Debug, Clone)]
pub struct ChoiceDescriptor {
    pub alternatives: Vec<ChoiceAlt>,
}

/// One alternative of a choice.
#[derive(Debug, Clone)]
pub enum ChoiceAlt {
    /// A literal text value.
    Str(String),

    /// A fixed boolean value.
    Bool(bool),

    /// A full sub-shape.
    Type(TypeDescriptor),
}

/// A string scalar.
pub fn string() -> TypeDescriptor {
    TypeDescriptor::String
}

/// An integer scalar.
pub fn integer() -> TypeDescriptor {
    TypeDescriptor::Integer
}

/// A float scalar.
pub fn float() -> TypeDescriptor {
    TypeDescriptor::Float
}

/// A boolean scalar.
pub fn boolean() -> TypeDescriptor {
    TypeDescriptor::Boolean
}

/// An integer-or-float scalar.
pub fn number() -> TypeDescriptor {
    TypeDescriptor::Number
}

/// Any node, exposed as an untyped document node.
pub fn any_node() -> TypeDescriptor {
    TypeDescriptor::AnyNode
}

/// A closed set of literal names.
pub fn enumeration(
    name: impl Into<String>,
    values: impl IntoIterator<Item = impl Into<String>>,
) -> TypeDescriptor {
    TypeDescriptor::Enum {
        name: name.into(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

/// A list of `element`.
pub fn list(element: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::List(Box::new(element))
}

/// A map of arbitrary string keys to `value`.
pub fn map(value: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::Map {
        key_pattern: None,
        value: Box::new(value),
    }
}

/// A map whose keys must full-match `key_pattern`.
pub fn map_matching(key_pattern: impl Into<String>, value: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::Map {
        key_pattern: Some(key_pattern.into()),
        value: Box::new(value),
    }
}

/// A reference to a named definition.
pub fn named(name: impl Into<String>) -> TypeDescriptor {
    TypeDescriptor::Named(name.into())
}

/// A value restricted to the given alternatives.
pub fn choice(alternatives: Vec<ChoiceAlt>) -> TypeDescriptor {
    TypeDescriptor::Choice(ChoiceDescriptor { alternatives })
}

/// A string restricted to the given literal values.
pub fn string_choice(values: impl IntoIterator<Item = impl Into<String>>) -> TypeDescriptor {
    choice(
        values
            .into_iter()
            .map(|v| ChoiceAlt::Str(v.into()))
            .collect(),
    )
}

/// A named definition: a plain object shape or a discriminated hierarchy.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Object(ObjectDef),
    Hierarchy(HierarchyDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Object(def) => &def.name,
            TypeDef::Hierarchy(def) => &def.name,
        }
    }
}

impl From<ObjectDef> for TypeDef {
    fn from(def: ObjectDef) -> Self {
        TypeDef::Object(def)
    }
}

impl From<HierarchyDef> for TypeDef {
    fn from(def: HierarchyDef) -> Self {
        TypeDef::Hierarchy(def)
    }
}

/// A plain object shape: named accessors with optional markers.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub name: String,

    /// Whether a document may supply a `$ref` object in place of this shape.
    pub resolvable: bool,

    /// Base object definitions whose accessors are merged into this one.
    pub extends: Vec<String>,

    pub properties: Vec<PropertyDef>,
}

impl ObjectDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolvable: false,
            extends: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Allow a `$ref` object in place of this shape.
    pub fn resolvable(mut self) -> Self {
        self.resolvable = true;
        self
    }

    /// Merge the accessors of a base definition into this one.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends.push(base.into());
        self
    }

    /// An optional property.
    pub fn property(self, accessor: impl Into<String>, shape: TypeDescriptor) -> Self {
        self.add(PropertyDef::new(accessor, shape))
    }

    /// An optional property whose document key differs from the accessor
    /// name.
    pub fn keyed_property(
        self,
        accessor: impl Into<String>,
        key: impl Into<String>,
        shape: TypeDescriptor,
    ) -> Self {
        let mut property = PropertyDef::new(accessor, shape);
        property.key = Some(key.into());
        self.add(property)
    }

    /// A mandatory property.
    pub fn mandatory(self, accessor: impl Into<String>, shape: TypeDescriptor) -> Self {
        let mut property = PropertyDef::new(accessor, shape);
        property.mandatory = true;
        self.add(property)
    }

    /// The discriminant property: mandatory, and fatal to the object when
    /// it does not conform.
    pub fn discriminant(self, accessor: impl Into<String>, shape: TypeDescriptor) -> Self {
        let mut property = PropertyDef::new(accessor, shape);
        property.mandatory = true;
        property.discriminant = true;
        self.add(property)
    }

    /// A pattern accessor: collects every property whose key full-matches
    /// `pattern` into a map of `shape` values.
    pub fn pattern(
        self,
        accessor: impl Into<String>,
        pattern: impl Into<String>,
        shape: TypeDescriptor,
    ) -> Self {
        let mut property = PropertyDef::new(accessor, shape);
        property.pattern = Some(pattern.into());
        self.add(property)
    }

    fn add(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }
}

/// One accessor of an object shape.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Accessor name on the materialized view.
    pub accessor: String,

    /// Document key, when it differs from the accessor name.
    pub key: Option<String>,

    pub mandatory: bool,
    pub discriminant: bool,

    /// Key pattern for pattern accessors.
    pub pattern: Option<String>,

    pub shape: TypeDescriptor,
}

impl PropertyDef {
    fn new(accessor: impl Into<String>, shape: TypeDescriptor) -> Self {
        Self {
            accessor: accessor.into(),
            key: None,
            mandatory: false,
            discriminant: false,
            pattern: None,
            shape,
        }
    }

    /// The document key this accessor reads.
    pub fn key_name(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.accessor)
    }
}

/// A discriminated hierarchy: a base name plus its closed set of variants.
#[derive(Debug, Clone)]
pub struct HierarchyDef {
    pub name: String,
    pub variants: Vec<String>,
}

impl HierarchyDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(name.into());
        self
    }
}

/// Registry of named definitions; the unit the compiler works on.
#[derive(Debug, Clone, Default)]
pub struct TypeSet {
    defs: HashMap<String, TypeDef>,
}

impl TypeSet {
    pub fn new() -> Self {
        TypeSet::default()
    }

    /// Register a definition under its own name. A re-registration replaces
    /// the previous definition.
    pub fn define(&mut self, def: impl Into<TypeDef>) -> &mut Self {
        let def = def.into();
        self.defs.insert(def.name().to_string(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_builder() {
        let def = ObjectDef::new("Config")
            .mandatory("title", string())
            .discriminant("kind", string_choice(["a", "b"]))
            .keyed_property("reference", "$ref", string())
            .pattern("extensions", "x-.*", any_node());

        assert_eq!(def.properties.len(), 4);
        assert!(def.properties[0].mandatory);
        assert!(def.properties[1].discriminant && def.properties[1].mandatory);
        assert_eq!(def.properties[2].key_name(), "$ref");
        assert_eq!(def.properties[3].pattern.as_deref(), Some("x-.*"));
    }

    #[test]
    fn test_type_set_lookup() {
        let mut types = TypeSet::new();
        types.define(ObjectDef::new("A").property("p", string()));
        types.define(HierarchyDef::new("B").variant("A"));

        assert!(matches!(types.get("A"), Some(TypeDef::Object(_))));
        assert!(matches!(types.get("B"), Some(TypeDef::Hierarchy(_))));
        assert!(types.get("C").is_none());
    }
}
