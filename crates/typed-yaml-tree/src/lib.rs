//! # typed-yaml-tree
//!
//! Generic YAML document trees with source location tracking.
//!
//! This crate provides the document model consumed by the validation engine
//! and the view materializer: an immutable arena of nodes (objects, arrays,
//! properties, scalars) with parent/sibling links, source positions for every
//! node, and a `Missing` sentinel so that navigation never fails.
//!
//! ## Design
//!
//! Nodes live in a `Document` arena and are addressed by `NodeId`; the public
//! handle is the lightweight [`Node`], a `(document, id)` pair. This follows
//! rust-analyzer's precedent of index-based trees: no lifetimes inside the
//! tree itself, cheap `Copy` handles, and parent links for free.
//!
//! ## Example
//!
//! ```rust
//! use typed_yaml_tree::parse;
//!
//! let doc = parse("title: My Document").unwrap();
//! let title = doc.root().get("title");
//! assert_eq!(title.text(), "My Document");
//! assert_eq!(title.pointer(), "/title");
//! ```

mod builder;
mod error;
mod node;
mod pointer;
mod source_info;

pub use builder::{parse, parse_file};
pub use error::{Error, Result};
pub use node::{Document, DocumentId, Node, NodeId, NodeKind, ScalarKind, TypeTag};
pub use pointer::{Pointer, PointerError};
pub use source_info::SourceInfo;
