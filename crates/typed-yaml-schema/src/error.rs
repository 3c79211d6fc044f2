//! Error types for schema compilation and view materialization.

use thiserror::Error;
use typed_yaml_grammar::GrammarError;
use typed_yaml_tree::PointerError;

/// Descriptor misuse, caught when the schema is compiled.
///
/// These are programmer errors in the schema definition itself; they fail
/// compilation, never validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A descriptor references a name with no definition.
    #[error("Unknown type \"{0}\"")]
    UnknownType(String),

    /// An inheritance base or variant slot names something that is not a
    /// plain object definition.
    #[error("Type \"{0}\" is not a plain object type")]
    ExpectedObject(String),

    /// A hierarchy variant must be a plain, non-resolvable object type.
    #[error("Variant \"{variant}\" of hierarchy \"{hierarchy}\" must be a plain object type")]
    BadVariant { hierarchy: String, variant: String },

    /// A hierarchy with no variants cannot be matched.
    #[error("Hierarchy \"{0}\" declares no variants")]
    EmptyHierarchy(String),

    /// At most one accessor per object may be the discriminant.
    #[error("Type \"{0}\" declares more than one discriminant")]
    DuplicateDiscriminant(String),

    /// A pattern accessor collects a map of matches; it cannot also be
    /// mandatory or a discriminant.
    #[error("Pattern accessor \"{accessor}\" on type \"{name}\" cannot be mandatory or a discriminant")]
    PatternMarkerConflict { name: String, accessor: String },

    /// An object with no accessors cannot be compiled.
    #[error("Object type \"{0}\" declares no properties")]
    EmptyObject(String),

    /// `extends` chains must not loop.
    #[error("Inheritance cycle through type \"{0}\"")]
    InheritanceCycle(String),

    /// An enum with no values cannot be matched.
    #[error("Enum \"{0}\" has no values")]
    EmptyEnum(String),

    /// A choice with no alternatives cannot be matched.
    #[error("Choice restriction with no alternatives")]
    EmptyChoice,

    /// A boolean choice must reduce to exactly one of `true`/`false`.
    #[error("A boolean choice must reduce to exactly one value")]
    BadBooleanChoice,

    /// Boolean alternatives cannot mix with strings or sub-types.
    #[error("Choice mixes boolean and non-boolean alternatives")]
    MixedChoice,

    /// The unconstrained-node escape hatch matches everything already.
    #[error("An unconstrained node cannot carry a choice restriction")]
    ChoiceOnAnyNode,

    /// Underlying grammar-assembly error (duplicate keys, bad patterns,
    /// rule redefinition).
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Fatal conditions while materializing a typed view.
///
/// Data-level absence is never an error (absent values materialize as
/// `TypedValue::Absent`); these are document contradictions or programming
/// errors.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A `$ref` whose target does not exist in the document.
    #[error("Cannot resolve reference \"{reference}\"")]
    UnresolvedRef { reference: String },

    /// A `$ref` whose pointer text cannot be interpreted.
    #[error(transparent)]
    Pointer(#[from] PointerError),

    /// The outcome handed to `materialize` was recorded for another
    /// document.
    #[error("Validation outcome does not belong to this document")]
    ForeignOutcome,

    /// A choice factory was applied to a node the grammar never matched.
    #[error("Node at \"{pointer}\" was never matched by this choice")]
    UnmatchedChoice { pointer: String },

    /// A deferred factory's target was never registered.
    #[error("No view factory registered for rule \"{name}\"")]
    UndefinedFactory { name: String },

    /// An accessor name that the object's shape does not declare.
    #[error("Type \"{name}\" has no accessor \"{accessor}\"")]
    UnknownAccessor { name: String, accessor: String },
}
