//! YAML tree builder: turns the yaml-rust2 event stream into a [`Document`].

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::node::{Document, DocumentId, NodeData, NodeId, NodeKind, ScalarKind};
use crate::{Error, Result, SourceInfo};

/// Parse YAML from a string, producing a [`Document`] tree.
///
/// This parses a single YAML document. If the input contains multiple
/// documents, only the first one will be parsed.
///
/// # Example
///
/// ```rust
/// use typed_yaml_tree::parse;
///
/// let doc = parse("title: My Document").unwrap();
/// assert!(doc.root().is_object());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or if parsing fails.
pub fn parse(content: &str) -> Result<Document> {
    parse_impl(content, None)
}

/// Parse YAML from a string with an associated filename.
///
/// The filename is included in source location information for better
/// error reporting.
///
/// # Errors
///
/// Returns an error if the YAML is invalid or if parsing fails.
pub fn parse_file(content: &str, filename: &str) -> Result<Document> {
    parse_impl(content, Some(filename))
}

fn parse_impl(content: &str, filename: Option<&str>) -> Result<Document> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = TreeBuilder::new(filename);

    parser
        .load(&mut builder, false) // false = single document only
        .map_err(Error::from)?;

    builder.result()
}

/// Builder that implements MarkedEventReceiver to construct the node arena.
struct TreeBuilder {
    /// Optional filename for source info
    filename: Option<String>,

    /// The arena being filled; slot 0 is the Missing sentinel.
    nodes: Vec<NodeData>,

    /// Stack of containers being constructed
    stack: Vec<Frame>,

    /// The completed root node
    root: Option<NodeId>,
}

/// A container being constructed during parsing.
enum Frame {
    Sequence {
        id: NodeId,
        start: Marker,
    },
    Mapping {
        id: NodeId,
        start: Marker,
        pending_key: Option<NodeId>,
    },
}

impl TreeBuilder {
    fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(|s| s.to_string()),
            nodes: vec![NodeData::new(NodeKind::Missing, SourceInfo::default())],
            stack: Vec::new(),
            root: None,
        }
    }

    fn result(self) -> Result<Document> {
        let root = self.root.ok_or(Error::EmptyDocument)?;
        Ok(Document {
            id: DocumentId::next(),
            nodes: self.nodes,
            root,
        })
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    fn make_source_info(&self, marker: &Marker, len: usize) -> SourceInfo {
        let mut info = SourceInfo::from_marker(marker, len);
        if let Some(ref filename) = self.filename {
            info = info.with_file(filename.clone());
        }
        info
    }

    fn zero_len_at(&self, source: &SourceInfo) -> SourceInfo {
        let mut info = source.clone();
        info.len = 0;
        info
    }

    fn push_complete(&mut self, node: NodeId) {
        let Some(frame) = self.stack.last_mut() else {
            // This is the root
            self.root = Some(node);
            return;
        };

        match frame {
            Frame::Sequence { id, .. } => {
                let parent = *id;
                self.attach(parent, node);
            }
            Frame::Mapping {
                id, pending_key, ..
            } => match pending_key.take() {
                None => *pending_key = Some(node),
                Some(key) => {
                    let parent = *id;
                    self.push_property(parent, key, node);
                }
            },
        }
    }

    /// Assemble a property subtree: `Property -> [Key, <key>, Value, <value>]`.
    fn push_property(&mut self, object: NodeId, key: NodeId, value: NodeId) {
        let key_source = self.nodes[key.index()].source.clone();
        let value_source = self.nodes[value.index()].source.clone();

        let entry_len = value_source
            .end_offset()
            .saturating_sub(key_source.offset);
        let entry_source = SourceInfo::new(
            self.filename.clone(),
            key_source.offset,
            key_source.line,
            key_source.col,
            entry_len,
        );

        let key_marker = self.alloc(NodeData::new(NodeKind::Key, self.zero_len_at(&key_source)));
        let value_marker =
            self.alloc(NodeData::new(NodeKind::Value, self.zero_len_at(&value_source)));
        let property = self.alloc(NodeData::new(NodeKind::Property, entry_source));

        self.attach(property, key_marker);
        self.attach(property, key);
        self.attach(property, value_marker);
        self.attach(property, value);
        self.attach(object, property);
    }

    fn close_container(&mut self, frame: Frame, end: &Marker) -> NodeId {
        let (id, start) = match frame {
            Frame::Sequence { id, start } => (id, start),
            Frame::Mapping { id, start, .. } => (id, start),
        };
        let len = end.index().saturating_sub(start.index());
        self.nodes[id.index()].source = self.make_source_info(&start, len);
        id
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing => {}

            Event::StreamStart => {}
            Event::StreamEnd => {}
            Event::DocumentStart => {}
            Event::DocumentEnd => {}

            Event::Scalar(value, style, _anchor_id, _tag) => {
                let source_info = self.make_source_info(&marker, value.len());
                let kind = scalar_token_kind(&value, style);
                let node = self.alloc(NodeData::scalar(kind, value, source_info));
                self.push_complete(node);
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                let id = self.alloc(NodeData::new(
                    NodeKind::Array,
                    self.make_source_info(&marker, 0),
                ));
                self.stack.push(Frame::Sequence { id, start: marker });
            }

            Event::SequenceEnd => {
                let frame = self.stack.pop().expect("SequenceEnd without SequenceStart");
                if !matches!(frame, Frame::Sequence { .. }) {
                    panic!("Expected Sequence build frame");
                }
                let id = self.close_container(frame, &marker);
                self.push_complete(id);
            }

            Event::MappingStart(_anchor_id, _tag) => {
                let id = self.alloc(NodeData::new(
                    NodeKind::Object,
                    self.make_source_info(&marker, 0),
                ));
                self.stack.push(Frame::Mapping {
                    id,
                    start: marker,
                    pending_key: None,
                });
            }

            Event::MappingEnd => {
                let frame = self.stack.pop().expect("MappingEnd without MappingStart");
                if !matches!(frame, Frame::Mapping { .. }) {
                    panic!("Expected Mapping build frame");
                }
                let id = self.close_container(frame, &marker);
                self.push_complete(id);
            }

            Event::Alias(_anchor_id) => {
                // Aliases are not supported; they degrade to null.
                let source_info = self.make_source_info(&marker, 0);
                let node = self.alloc(NodeData::scalar(
                    ScalarKind::Null,
                    String::new(),
                    source_info,
                ));
                self.push_complete(node);
            }
        }
    }
}

/// Recognize the token kind of a scalar.
///
/// Quoted and block scalars are always strings; plain scalars go through
/// YAML 1.1 type inference: integers, floats, booleans, null, then string.
fn scalar_token_kind(value: &str, style: TScalarStyle) -> ScalarKind {
    if style != TScalarStyle::Plain {
        return ScalarKind::String;
    }

    if value.parse::<i64>().is_ok() {
        return ScalarKind::Integer;
    }

    if value.parse::<f64>().is_ok() {
        return ScalarKind::Float;
    }

    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" | "y" | "Y" => {
            ScalarKind::BooleanTrue
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" | "n" | "N" => {
            ScalarKind::BooleanFalse
        }
        "null" | "Null" | "NULL" | "~" | "" => ScalarKind::Null,
        _ => ScalarKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar() {
        let doc = parse("hello").unwrap();
        let root = doc.root();

        assert!(root.is_scalar());
        assert!(root.is_token(ScalarKind::String));
        assert_eq!(root.text(), "hello");
    }

    #[test]
    fn test_parse_integer() {
        let doc = parse("42").unwrap();
        assert!(doc.root().is_token(ScalarKind::Integer));
        assert_eq!(doc.root().int_value(), 42);
    }

    #[test]
    fn test_parse_float() {
        let doc = parse("42.5").unwrap();
        assert!(doc.root().is_token(ScalarKind::Float));
        assert_eq!(doc.root().float_value(), 42.5);
    }

    #[test]
    fn test_parse_booleans() {
        for text in ["true", "yes", "y", "On"] {
            let doc = parse(text).unwrap();
            assert!(
                doc.root().is_token(ScalarKind::BooleanTrue),
                "{text} should be a true token"
            );
        }
        let doc = parse("off").unwrap();
        assert!(doc.root().is_token(ScalarKind::BooleanFalse));
        assert!(!doc.root().bool_value());
    }

    #[test]
    fn test_parse_null_forms() {
        for text in ["null", "~", "Null"] {
            let doc = parse(text).unwrap();
            assert!(doc.root().is_null(), "{text} should be null");
        }
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        let doc = parse("p1: \"42\"").unwrap();
        assert!(doc.root().get("p1").is_token(ScalarKind::String));
    }

    #[test]
    fn test_parse_array() {
        let doc = parse("[1, 2, 3]").unwrap();
        let root = doc.root();

        assert!(root.is_array());
        let elements = root.elements();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].int_value(), 1);
        assert_eq!(elements[2].int_value(), 3);
    }

    #[test]
    fn test_parse_hash() {
        let doc = parse("title: My Document\nauthor: John Doe").unwrap();
        let root = doc.root();

        assert!(root.is_object());
        assert_eq!(root.get("title").text(), "My Document");
        assert_eq!(root.get("author").text(), "John Doe");
    }

    #[test]
    fn test_nested_structure() {
        let doc = parse(
            r#"
project:
  title: My Project
  authors:
    - Alice
    - Bob
"#,
        )
        .unwrap();

        let project = doc.root().get("project");
        assert!(project.is_object());

        let authors = project.get("authors");
        assert!(authors.is_array());
        assert_eq!(authors.elements().len(), 2);
    }

    #[test]
    fn test_source_info_tracking() {
        let doc = parse("title: My Document").unwrap();
        let title = doc.root().get("title");

        assert_eq!(title.source().line, 1);
        assert_eq!(title.source().col, 8);
        assert_eq!(title.source().len, "My Document".len());
    }

    #[test]
    fn test_parse_with_filename() {
        let doc = parse_file("title: Test", "config.yaml").unwrap();
        assert_eq!(doc.root().source().file, Some("config.yaml".into()));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse(""), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = parse("p1: [unclosed");
        assert!(matches!(result, Err(Error::ParseError { .. })));
    }
}
