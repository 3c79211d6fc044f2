//! # typed-yaml-schema
//!
//! Schema compilation and typed, read-only views over validated YAML.
//!
//! Callers describe the shape of the data they want with an explicit
//! [`TypeDescriptor`] graph registered in a [`TypeSet`] — scalars, lists,
//! maps, plain objects, discriminated hierarchies, choice-restricted values,
//! and resolvable (`$ref`-capable) objects. [`compile`] turns a descriptor
//! graph into a [`CompiledSchema`]: a validation grammar plus, in lock-step,
//! a table of view factories keyed by the same rule keys.
//!
//! After validation, [`materialize`] produces a [`TypedValue`] directly over
//! the document nodes: collections and objects wrap — not copy — their
//! nodes, resolve accessors lazily on first use, and cache per view
//! instance. Self-referential descriptor graphs work because factories for
//! named shapes are looked up through the shared key table only at
//! materialization time.
//!
//! ## Example
//!
//! ```rust
//! use typed_yaml_schema::descriptor::{self, ObjectDef};
//! use typed_yaml_schema::{TypedParser, TypeSet};
//!
//! let mut types = TypeSet::new();
//! types.define(
//!     ObjectDef::new("Config")
//!         .mandatory("title", descriptor::string())
//!         .property("tags", descriptor::list(descriptor::string())),
//! );
//!
//! let parser = TypedParser::compile(&types, "Config").unwrap();
//! let parsed = parser.parse("title: My Document\ntags: [a, b]").unwrap();
//! assert!(parsed.accepted());
//!
//! let view = parser.view(&parsed).unwrap();
//! let config = view.as_object().unwrap();
//! assert_eq!(config.get("title").unwrap().as_str(), Some("My Document"));
//! ```

mod compiler;
pub mod descriptor;
mod error;
mod parser;
mod views;

pub use compiler::{compile, CompiledSchema};
pub use descriptor::{
    ChoiceAlt, ChoiceDescriptor, HierarchyDef, ObjectDef, PropertyDef, TypeDef, TypeDescriptor,
    TypeSet,
};
pub use error::{SchemaError, ViewError};
pub use parser::{ParseError, ParsedDocument, TypedParser};
pub use views::value::{materialize, ListView, MapView, ObjectView, TypedValue};
pub use views::{ViewFactory, ViewTable};
