//! The integrated parser façade: compile once, then parse, validate and
//! materialize documents against the same schema.

use thiserror::Error;
use typed_yaml_grammar::{validate, EngineError, Outcome, Severity, ValidationIssue};
use typed_yaml_tree::Document;

use crate::compiler::{compile, CompiledSchema};
use crate::descriptor::TypeSet;
use crate::error::{SchemaError, ViewError};
use crate::views::value::{materialize, TypedValue};

/// Hard failures of a parse call: the document could not be interpreted.
///
/// Schema non-conformance is not an error — it comes back as issue data on
/// the [`ParsedDocument`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Yaml(#[from] typed_yaml_tree::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A parser bound to one compiled schema.
///
/// ```rust
/// use typed_yaml_schema::descriptor::{self, ObjectDef};
/// use typed_yaml_schema::{TypedParser, TypeSet};
///
/// let mut types = TypeSet::new();
/// types.define(ObjectDef::new("Config").mandatory("name", descriptor::string()));
///
/// let parser = TypedParser::compile(&types, "Config").unwrap();
/// let parsed = parser.parse("name: demo").unwrap();
/// assert!(parsed.accepted());
/// ```
pub struct TypedParser {
    compiled: CompiledSchema,
    strict: bool,
}

impl TypedParser {
    /// Compile the named root shape of `types` into a parser.
    pub fn compile(types: &TypeSet, root: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            compiled: compile(types, root)?,
            strict: false,
        })
    }

    /// In strict mode warnings count against acceptance, so documents with
    /// unexpected properties are rejected.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.compiled
    }

    /// Parse and validate a document.
    pub fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let doc = typed_yaml_tree::parse(text)?;
        self.run(doc)
    }

    /// Parse and validate a document, tagging positions with a filename.
    pub fn parse_file(&self, text: &str, filename: &str) -> Result<ParsedDocument, ParseError> {
        let doc = typed_yaml_tree::parse_file(text, filename)?;
        self.run(doc)
    }

    fn run(&self, doc: Document) -> Result<ParsedDocument, ParseError> {
        let outcome = validate(&self.compiled.grammar, &doc)?;
        Ok(ParsedDocument {
            doc,
            outcome,
            strict: self.strict,
        })
    }

    /// Materialize the typed root view of a parsed document.
    pub fn view<'a>(&'a self, parsed: &'a ParsedDocument) -> Result<TypedValue<'a>, ViewError> {
        materialize(&self.compiled, &parsed.doc, &parsed.outcome)
    }
}

/// A parsed document together with its validation outcome.
pub struct ParsedDocument {
    doc: Document,
    outcome: Outcome,
    strict: bool,
}

impl ParsedDocument {
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.outcome.issues
    }

    /// Whether the document conforms. Warnings are tolerated unless the
    /// parser runs in strict mode.
    pub fn accepted(&self) -> bool {
        if self.strict {
            self.outcome.issues.is_empty()
        } else {
            self.outcome.accepted
        }
    }

    /// Failures only, skipping warnings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.outcome.issues_of(Severity::Error)
    }
}
