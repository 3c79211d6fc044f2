//! JSON-Pointer navigation (RFC 6901) over document trees.
//!
//! Pointers are the one bit-exact external format this crate speaks: `""` is
//! the whole document, segments are `/`-separated, `~1` unescapes to `/` and
//! `~0` to `~`. Navigating to an absent segment yields the Missing sentinel,
//! never an error; only malformed pointer *text* is an error.

use std::fmt;

use thiserror::Error;

use crate::node::{Node, NodeKind};

/// Errors raised for pointer text that cannot be interpreted at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("Pointer {0:?} must be empty or start with '/'")]
    MissingLeadingSlash(String),

    /// `~` must be followed by `0` or `1`.
    #[error("Invalid escape sequence in pointer segment {0:?}")]
    InvalidEscape(String),

    /// A `$ref` value that does not target the current document.
    #[error("Reference {0:?} does not target the current document")]
    ForeignReference(String),
}

/// A parsed JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// The empty pointer, designating the document root.
    pub fn root() -> Self {
        Pointer::default()
    }

    /// Parse a JSON pointer string.
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        if text.is_empty() {
            return Ok(Pointer::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(text.to_string()));
        };
        let segments = rest
            .split('/')
            .map(unescape_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pointer { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape_segment(segment))?;
        }
        Ok(())
    }
}

fn unescape_segment(segment: &str) -> Result<String, PointerError> {
    if !segment.contains('~') {
        return Ok(segment.to_string());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(PointerError::InvalidEscape(segment.to_string())),
        }
    }
    Ok(out)
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl<'a> Node<'a> {
    /// Get the node pointed at by the supplied JSON pointer.
    ///
    /// Returns the Missing sentinel when any segment does not exist.
    pub fn at(&self, pointer: &Pointer) -> Node<'a> {
        let mut current = *self;
        for segment in pointer.segments() {
            current = current.descend(segment);
            if current.is_missing() {
                break;
            }
        }
        current
    }

    /// Get the node pointed at by the supplied JSON pointer string.
    ///
    /// The pointer must be empty or start with `/`; anything else is a
    /// document-level contradiction and fails hard.
    pub fn at_str(&self, pointer: &str) -> Result<Node<'a>, PointerError> {
        Ok(self.at(&Pointer::parse(pointer)?))
    }

    fn descend(&self, segment: &str) -> Node<'a> {
        match self.kind() {
            NodeKind::Object => self.get(segment),
            NodeKind::Array => match segment.parse::<usize>() {
                Ok(index) => self
                    .elements()
                    .get(index)
                    .copied()
                    .unwrap_or_else(|| self.document().missing()),
                Err(_) => self.document().missing(),
            },
            _ => self.document().missing(),
        }
    }

    /// Build this node's own JSON pointer, from the document root.
    ///
    /// Syntax markers are skipped; property steps contribute their escaped
    /// key, array elements contribute their index. The result round-trips
    /// through [`Node::at`].
    pub fn pointer(&self) -> String {
        let mut segments = Vec::new();
        let mut current = *self;
        loop {
            let parent = current.parent();
            if parent.is_missing() {
                break;
            }
            // Syntax markers contribute nothing; property wrappers already
            // contributed through their key node.
            if !current.is_syntax() && !current.is_property() {
                let key = current.key();
                if !key.is_missing() {
                    segments.push(escape_segment(key.text()));
                } else if parent.is_array() {
                    if let Some(index) = parent.children().position(|c| c == current) {
                        segments.push(index.to_string());
                    }
                }
            }
            current = parent;
        }
        segments.reverse();
        let mut out = String::new();
        for segment in segments {
            out.push('/');
            out.push_str(&segment);
        }
        out
    }

    /// Verify if this node is a reference object: an object with a unique
    /// `$ref` property.
    pub fn is_ref(&self) -> bool {
        if !self.is_object() {
            return false;
        }
        let names = self.property_names();
        names.len() == 1 && names[0] == "$ref"
    }

    /// Resolve this reference to the actual node. Only same-document
    /// references (`#/...`) are supported.
    ///
    /// A non-reference node resolves to itself. An absent target resolves to
    /// Missing — distinguishing "target not found" from "malformed pointer",
    /// which is an error.
    pub fn resolve(&self) -> Result<Node<'a>, PointerError> {
        if !self.is_ref() {
            return Ok(*self);
        }
        let target = self.get("$ref");
        let text = target.text();
        let Some(fragment) = text.strip_prefix('#') else {
            return Err(PointerError::ForeignReference(text.to_string()));
        };
        let pointer = Pointer::parse(fragment)?;
        Ok(self.document_root().at(&pointer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_parse_and_display_round_trip() {
        for text in ["", "/a", "/a/0/b", "/a~1b/c~0d"] {
            let pointer = Pointer::parse(text).unwrap();
            assert_eq!(pointer.to_string(), text);
        }
    }

    #[test]
    fn test_unescaping() {
        let pointer = Pointer::parse("/a~1b/~0").unwrap();
        assert_eq!(pointer.segments(), &["a/b".to_string(), "~".to_string()]);
    }

    #[test]
    fn test_malformed_pointers() {
        assert!(matches!(
            Pointer::parse("a/b"),
            Err(PointerError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            Pointer::parse("/a~2b"),
            Err(PointerError::InvalidEscape(_))
        ));
        assert!(matches!(
            Pointer::parse("/a~"),
            Err(PointerError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_at_self() {
        let doc = parse("some scalar").unwrap();
        let root = doc.root();

        assert_eq!(root.at_str("").unwrap(), root);
    }

    #[test]
    fn test_at_property_and_element() {
        let doc = parse("p1:\n  p2: [1, 2, 3]").unwrap();
        let root = doc.root();

        assert_eq!(root.at_str("/p1/p2/1").unwrap().int_value(), 2);
        assert!(root.at_str("/p1/p3").unwrap().is_missing());
        assert!(root.at_str("/p1/p2/9").unwrap().is_missing());
    }

    #[test]
    fn test_pointer_round_trip() {
        let doc = parse("a:\n  b: [x, y, z]").unwrap();
        let root = doc.root();
        let node = root.at_str("/a/b/2").unwrap();

        assert_eq!(node.pointer(), "/a/b/2");
        assert_eq!(root.at_str(&node.pointer()).unwrap(), node);
    }

    #[test]
    fn test_pointer_through_array_of_objects() {
        let doc = parse("items:\n  - a: 1\n  - b: 2").unwrap();
        let node = doc.root().at_str("/items/1/b").unwrap();

        assert_eq!(node.int_value(), 2);
        assert_eq!(node.pointer(), "/items/1/b");
    }

    #[test]
    fn test_pointer_escapes_keys() {
        let doc = parse("\"a/b\": 1").unwrap();
        let node = doc.root().get("a/b");

        assert_eq!(node.pointer(), "/a~1b");
        assert_eq!(doc.root().at_str("/a~1b").unwrap(), node);
    }

    #[test]
    fn test_is_ref() {
        let doc = parse("p1: v1\np2:\n  $ref: \"#/p1\"").unwrap();
        let root = doc.root();

        assert!(root.get("p2").is_ref());
        assert!(!root.get("p1").is_ref());
        assert!(!root.is_ref());
    }

    #[test]
    fn test_resolve_reference() {
        let doc = parse("p1: v1\np2:\n  $ref: \"#/p1\"").unwrap();
        let root = doc.root();

        let resolved = root.at_str("/p2").unwrap().resolve().unwrap();
        assert_eq!(resolved, root.at_str("/p1").unwrap());
    }

    #[test]
    fn test_resolve_non_reference_is_identity() {
        let doc = parse("p1: v1").unwrap();
        let node = doc.root().get("p1");

        assert_eq!(node.resolve().unwrap(), node);
    }

    #[test]
    fn test_resolve_absent_target() {
        let doc = parse("p2:\n  $ref: \"#/nope\"").unwrap();
        let resolved = doc.root().get("p2").resolve().unwrap();

        assert!(resolved.is_missing());
    }

    #[test]
    fn test_resolve_foreign_reference() {
        let doc = parse("p2:\n  $ref: \"other.yaml#/p1\"").unwrap();

        assert!(matches!(
            doc.root().get("p2").resolve(),
            Err(PointerError::ForeignReference(_))
        ));
    }
}
