//! The document node arena and its read-only accessors.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::SourceInfo;

/// Process-unique identity of one built [`Document`].
///
/// Stable across moves of the owning value, unlike its address; consumers
/// use it to verify that node ids and recorded validation state refer to the
/// same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        DocumentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a node inside its [`Document`] arena.
///
/// Slot 0 is permanently reserved for the Missing sentinel, so an id of 0
/// always means "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) const MISSING: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural kind of a document node.
///
/// `Key` and `Value` are the structural marker tokens inside a property:
/// a `Property` node's children are exactly `[Key, <key>, Value, <value>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    Property,
    Key,
    Value,
    Scalar,
    Missing,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Object => "OBJECT",
            NodeKind::Array => "ARRAY",
            NodeKind::Property => "PROPERTY",
            NodeKind::Key => "KEY",
            NodeKind::Value => "VALUE",
            NodeKind::Scalar => "SCALAR",
            NodeKind::Missing => "MISSING",
        };
        f.write_str(name)
    }
}

/// Token kind of a scalar node, as recognized by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    BooleanTrue,
    BooleanFalse,
    Null,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "STRING",
            ScalarKind::Integer => "INTEGER",
            ScalarKind::Float => "FLOAT",
            ScalarKind::BooleanTrue => "TRUE",
            ScalarKind::BooleanFalse => "FALSE",
            ScalarKind::Null => "NULL",
        };
        f.write_str(name)
    }
}

/// Semantic type stamped onto a node by an external grammar after the node
/// has been accepted by a named rule. Opaque to the tree itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(u32);

impl TypeTag {
    pub fn new(raw: u32) -> Self {
        TypeTag(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Arena storage for one node.
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    /// Scalar token: recognized kind plus the literal text.
    pub(crate) token: Option<(ScalarKind, String)>,
    pub(crate) source: SourceInfo,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Decoration slot, written once per validation run by named rules.
    pub(crate) decoration: Cell<Option<TypeTag>>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind, source: SourceInfo) -> Self {
        Self {
            kind,
            token: None,
            source,
            parent: None,
            children: Vec::new(),
            decoration: Cell::new(None),
        }
    }

    pub(crate) fn scalar(kind: ScalarKind, text: String, source: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Scalar,
            token: Some((kind, text)),
            source,
            parent: None,
            children: Vec::new(),
            decoration: Cell::new(None),
        }
    }
}

/// An immutable YAML document tree.
///
/// Built once by the tree builder, then consumed read-only by the grammar
/// engine and the view materializer. The only mutable state is the per-node
/// decoration slot, which is a `Cell` — this intentionally makes `Document`
/// `!Sync`; share validated documents across threads only after external
/// synchronization.
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) root: NodeId,
}

impl Document {
    /// The process-unique identity of this document.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The root node of the document.
    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            id: self.root,
        }
    }

    /// The Missing sentinel of this document.
    pub fn missing(&self) -> Node<'_> {
        Node {
            doc: self,
            id: NodeId::MISSING,
        }
    }

    /// Look a node up by id. Out-of-range ids resolve to Missing.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        if id.index() < self.nodes.len() {
            Node { doc: self, id }
        } else {
            self.missing()
        }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

/// A lightweight handle to a node inside a [`Document`].
///
/// All accessors are pure and total: called on the Missing sentinel they
/// return empty/zero defaults instead of failing.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) id: NodeId,
}

impl<'a> PartialEq for Node<'a> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl<'a> Eq for Node<'a> {}

impl<'a> fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({} at {:?})", self.kind(), self.pointer())
    }
}

impl<'a> Node<'a> {
    fn data(&self) -> &'a NodeData {
        self.doc.data(self.id)
    }

    /// The document this node belongs to.
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// The arena id of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The root node of the owning document.
    pub fn document_root(&self) -> Node<'a> {
        self.doc.root()
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn is_missing(&self) -> bool {
        self.id == NodeId::MISSING
    }

    pub fn is_object(&self) -> bool {
        self.kind() == NodeKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind() == NodeKind::Array
    }

    pub fn is_property(&self) -> bool {
        self.kind() == NodeKind::Property
    }

    pub fn is_scalar(&self) -> bool {
        self.kind() == NodeKind::Scalar
    }

    /// `true` for the structural marker tokens (`Key`, `Value`).
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind(), NodeKind::Key | NodeKind::Value)
    }

    /// `true` if this is a scalar carrying the null token.
    pub fn is_null(&self) -> bool {
        self.is_token(ScalarKind::Null)
    }

    /// The scalar token kind, if this is a scalar node.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        self.data().token.as_ref().map(|(k, _)| *k)
    }

    /// Check the scalar token kind.
    pub fn is_token(&self, kind: ScalarKind) -> bool {
        self.scalar_kind() == Some(kind)
    }

    /// The literal token text, or `""` for non-scalar nodes.
    pub fn text(&self) -> &'a str {
        match &self.data().token {
            Some((_, text)) => text,
            None => "",
        }
    }

    /// The value of this node, if this is a scalar node.
    pub fn string_value(&self) -> &'a str {
        self.text()
    }

    /// Try to parse this node's value as an integer. Returns `0` otherwise.
    pub fn int_value(&self) -> i64 {
        self.text().parse().unwrap_or(0)
    }

    /// Try to parse this node's value as a float. Returns `0.0` otherwise.
    pub fn float_value(&self) -> f64 {
        self.text().parse().unwrap_or(0.0)
    }

    /// The value of this node, if this is a boolean node. `false` otherwise.
    pub fn bool_value(&self) -> bool {
        self.is_token(ScalarKind::BooleanTrue)
    }

    pub fn source(&self) -> &'a SourceInfo {
        &self.data().source
    }

    /// The parent node, or Missing for the root and the sentinel.
    pub fn parent(&self) -> Node<'a> {
        match self.data().parent {
            Some(id) => Node { doc: self.doc, id },
            None => self.doc.missing(),
        }
    }

    /// Direct children, in document order.
    pub fn children(self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| Node { doc, id })
    }

    /// Direct children matching the supplied kind.
    pub fn children_of_kind(self, kind: NodeKind) -> impl Iterator<Item = Node<'a>> + 'a {
        self.children().filter(move |c| c.kind() == kind)
    }

    fn sibling(&self, offset: isize) -> Node<'a> {
        let parent = self.parent();
        if parent.is_missing() {
            return self.doc.missing();
        }
        let siblings = &parent.data().children;
        let pos = siblings.iter().position(|&id| id == self.id);
        match pos {
            Some(i) => {
                let j = i as isize + offset;
                if j >= 0 && (j as usize) < siblings.len() {
                    Node {
                        doc: self.doc,
                        id: siblings[j as usize],
                    }
                } else {
                    self.doc.missing()
                }
            }
            None => self.doc.missing(),
        }
    }

    /// The previous sibling, or Missing.
    pub fn prev_sibling(&self) -> Node<'a> {
        self.sibling(-1)
    }

    /// The next sibling, or Missing.
    pub fn next_sibling(&self) -> Node<'a> {
        self.sibling(1)
    }

    fn child_after_marker(&self, marker: NodeKind) -> Node<'a> {
        let mut children = self.children();
        while let Some(c) = children.next() {
            if c.kind() == marker {
                return children.next().unwrap_or_else(|| self.doc.missing());
            }
        }
        self.doc.missing()
    }

    /// Get the property key node associated to this node.
    ///
    /// Works for property nodes, property key nodes and property value nodes;
    /// any other node returns Missing.
    pub fn key(&self) -> Node<'a> {
        if self.is_property() {
            return self.child_after_marker(NodeKind::Key);
        }
        let prev = self.prev_sibling();
        match prev.kind() {
            NodeKind::Key => *self,
            NodeKind::Value => {
                let before = prev.prev_sibling();
                if before.kind() == NodeKind::Key {
                    self.doc.missing()
                } else {
                    before
                }
            }
            _ => self.doc.missing(),
        }
    }

    /// Get the property value node associated to this node.
    ///
    /// Works for property nodes, property key nodes and property value nodes;
    /// any other node returns Missing.
    pub fn value(&self) -> Node<'a> {
        if self.is_property() {
            return self.child_after_marker(NodeKind::Value);
        }
        let prev = self.prev_sibling();
        match prev.kind() {
            NodeKind::Value => *self,
            NodeKind::Key => {
                let marker = self.next_sibling();
                if marker.kind() == NodeKind::Value {
                    let v = marker.next_sibling();
                    if v.is_missing() { self.doc.missing() } else { v }
                } else {
                    self.doc.missing()
                }
            }
            _ => self.doc.missing(),
        }
    }

    /// Get the object property named `name`. Works only for object nodes;
    /// everything else (and an absent key) returns Missing.
    pub fn get(&self, name: &str) -> Node<'a> {
        for property in self.children_of_kind(NodeKind::Property) {
            if property.key().text() == name {
                return property.value();
            }
        }
        self.doc.missing()
    }

    /// Property names of this node, if it represents an object.
    pub fn property_names(&self) -> Vec<String> {
        self.children_of_kind(NodeKind::Property)
            .map(|p| p.key().text().to_string())
            .collect()
    }

    /// Property value nodes of this node, if it represents an object.
    pub fn properties(&self) -> Vec<Node<'a>> {
        self.children_of_kind(NodeKind::Property)
            .map(|p| p.value())
            .collect()
    }

    /// Property `(key, value)` node pairs, in document order.
    pub fn entries(&self) -> Vec<(Node<'a>, Node<'a>)> {
        self.children_of_kind(NodeKind::Property)
            .map(|p| (p.key(), p.value()))
            .collect()
    }

    /// Property value nodes indexed by property name.
    pub fn property_map(&self) -> HashMap<String, Node<'a>> {
        self.children_of_kind(NodeKind::Property)
            .map(|p| (p.key().text().to_string(), p.value()))
            .collect()
    }

    /// Element nodes of this node, if it represents an array.
    pub fn elements(&self) -> Vec<Node<'a>> {
        if self.is_array() {
            self.children().collect()
        } else {
            Vec::new()
        }
    }

    /// Stamp this node with a semantic type.
    pub fn decorate(&self, tag: TypeTag) {
        self.data().decoration.set(Some(tag));
    }

    /// The semantic type stamped by the last named rule that accepted this
    /// node, if any.
    pub fn decoration(&self) -> Option<TypeTag> {
        self.data().decoration.get()
    }
}
