//! Typed, read-only views materialized over validated document nodes.
//!
//! Views wrap their node; nothing is re-encoded into a separate value tree.
//! Collections and object accessors resolve lazily on first access and cache
//! per view instance — clones of a view share its caches, separate
//! materializations of the same node do not.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use regex::Regex;
use typed_yaml_grammar::{ChoiceMatches, Grammar, Outcome};
use typed_yaml_tree::{Document, Node, ScalarKind};

use crate::compiler::CompiledSchema;
use crate::error::ViewError;
use crate::views::{BindingTarget, ObjectFactory, ViewFactory, ViewTable};

/// Everything a factory needs at materialization time.
#[derive(Clone, Copy)]
pub(crate) struct ViewContext<'a> {
    pub(crate) grammar: &'a Grammar,
    pub(crate) views: &'a ViewTable,
    pub(crate) matches: &'a ChoiceMatches,
}

/// Materialize the typed root view of a validated document.
///
/// The outcome must come from validating `doc` against `schema`'s grammar:
/// choice factories delegate through the first-of matches it recorded.
pub fn materialize<'a>(
    schema: &'a CompiledSchema,
    doc: &'a Document,
    outcome: &'a Outcome,
) -> Result<TypedValue<'a>, ViewError> {
    if outcome.matches.document() != Some(doc.id()) {
        return Err(ViewError::ForeignOutcome);
    }
    let cx = ViewContext {
        grammar: &schema.grammar,
        views: &schema.views,
        matches: &outcome.matches,
    };
    let factory = schema
        .views
        .get(schema.root)
        .ok_or_else(|| ViewError::UndefinedFactory {
            name: schema.grammar.rule_name(schema.root).to_string(),
        })?;
    build(factory, doc.root(), cx)
}

/// Apply one factory to one node.
pub(crate) fn build<'a>(
    factory: &'a ViewFactory,
    node: Node<'a>,
    cx: ViewContext<'a>,
) -> Result<TypedValue<'a>, ViewError> {
    // Structurally absent and explicitly null both materialize as absence.
    if node.is_missing() || node.is_null() {
        return Ok(TypedValue::Absent);
    }

    match factory {
        ViewFactory::Str => Ok(TypedValue::Str(node.text().to_string())),
        ViewFactory::Int => Ok(TypedValue::Int(node.int_value())),
        ViewFactory::Float => Ok(TypedValue::Float(node.float_value())),
        ViewFactory::Bool => Ok(TypedValue::Bool(node.bool_value())),
        ViewFactory::Number => {
            if node.is_token(ScalarKind::Integer) {
                Ok(TypedValue::Int(node.int_value()))
            } else {
                Ok(TypedValue::Float(node.float_value()))
            }
        }
        ViewFactory::Identity => Ok(TypedValue::Node(node)),
        ViewFactory::List(element) => Ok(TypedValue::List(ListView::new(node, element, cx))),
        ViewFactory::Map { pattern, value } => {
            Ok(TypedValue::Map(MapView::new(node, pattern.as_ref(), value, cx)))
        }
        ViewFactory::Object(def) => Ok(TypedValue::Object(ObjectView::new(node, def, cx))),
        ViewFactory::Choice {
            choice,
            alternatives,
        } => {
            let index = cx.matches.matched(*choice, node.id()).ok_or_else(|| {
                ViewError::UnmatchedChoice {
                    pointer: node.pointer(),
                }
            })?;
            build(&alternatives[index], node, cx)
        }
        ViewFactory::Deferred(key) => {
            let target = cx.views.get(*key).ok_or_else(|| ViewError::UndefinedFactory {
                name: cx.grammar.rule_name(*key).to_string(),
            })?;
            build(target, node, cx)
        }
    }
}

/// A typed, read-only value over a validated document node.
#[derive(Debug, Clone)]
pub enum TypedValue<'a> {
    /// The property or value is structurally absent or explicitly null.
    Absent,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// The raw document node, for unconstrained shapes.
    Node(Node<'a>),
    List(ListView<'a>),
    Map(MapView<'a>),
    Object(ObjectView<'a>),
}

impl<'a> TypedValue<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, TypedValue::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(value) => Some(*value),
            TypedValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<Node<'a>> {
        match self {
            TypedValue::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListView<'a>> {
        match self {
            TypedValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapView<'a>> {
        match self {
            TypedValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectView<'a>> {
        match self {
            TypedValue::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// A lazy list view wrapping a sequence node.
#[derive(Clone)]
pub struct ListView<'a> {
    inner: Rc<ListInner<'a>>,
}

struct ListInner<'a> {
    node: Node<'a>,
    element: &'a ViewFactory,
    cx: ViewContext<'a>,
    cache: OnceCell<Vec<TypedValue<'a>>>,
}

impl<'a> ListView<'a> {
    pub(crate) fn new(node: Node<'a>, element: &'a ViewFactory, cx: ViewContext<'a>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                node,
                element,
                cx,
                cache: OnceCell::new(),
            }),
        }
    }

    /// The underlying sequence node.
    pub fn node(&self) -> Node<'a> {
        self.inner.node
    }

    /// Element count, read from the node without materializing.
    pub fn len(&self) -> usize {
        self.inner.node.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn items(&self) -> Result<&Vec<TypedValue<'a>>, ViewError> {
        self.inner.cache.get_or_try_init(|| {
            self.inner
                .node
                .elements()
                .into_iter()
                .map(|element| build(self.inner.element, element, self.inner.cx))
                .collect()
        })
    }

    /// The element at `index`, or `Absent` past the end.
    pub fn get(&self, index: usize) -> Result<TypedValue<'a>, ViewError> {
        Ok(self
            .items()?
            .get(index)
            .cloned()
            .unwrap_or(TypedValue::Absent))
    }

    /// All elements, materialized.
    pub fn to_vec(&self) -> Result<Vec<TypedValue<'a>>, ViewError> {
        Ok(self.items()?.clone())
    }
}

impl<'a> fmt::Debug for ListView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListView({:?})", self.inner.node)
    }
}

/// Which document keys belong to a map view.
#[derive(Clone, Copy)]
enum MapSelector<'a> {
    /// Every key: the unrestricted map.
    All,

    /// Keys full-matching a pattern: the key-restricted map.
    Pattern(&'a Regex),

    /// Keys the enclosing object routes to one pattern accessor. A key
    /// matching two declared patterns belongs only to the first.
    Routed {
        object: &'a ObjectFactory,
        binding: usize,
    },
}

impl<'a> MapSelector<'a> {
    fn matches(&self, key: &str) -> bool {
        match self {
            MapSelector::All => true,
            MapSelector::Pattern(pattern) => pattern.is_match(key),
            MapSelector::Routed { object, binding } => object.pattern_route(key) == Some(*binding),
        }
    }
}

/// A lazy map view over an object node's (optionally pattern-restricted)
/// properties.
#[derive(Clone)]
pub struct MapView<'a> {
    inner: Rc<MapInner<'a>>,
}

struct MapInner<'a> {
    node: Node<'a>,
    selector: MapSelector<'a>,
    value: &'a ViewFactory,
    cx: ViewContext<'a>,
    cache: OnceCell<Vec<(String, TypedValue<'a>)>>,
}

impl<'a> MapView<'a> {
    pub(crate) fn new(
        node: Node<'a>,
        pattern: Option<&'a Regex>,
        value: &'a ViewFactory,
        cx: ViewContext<'a>,
    ) -> Self {
        let selector = match pattern {
            Some(pattern) => MapSelector::Pattern(pattern),
            None => MapSelector::All,
        };
        Self::with_selector(node, selector, value, cx)
    }

    pub(crate) fn routed(
        node: Node<'a>,
        object: &'a ObjectFactory,
        binding: usize,
        value: &'a ViewFactory,
        cx: ViewContext<'a>,
    ) -> Self {
        Self::with_selector(node, MapSelector::Routed { object, binding }, value, cx)
    }

    fn with_selector(
        node: Node<'a>,
        selector: MapSelector<'a>,
        value: &'a ViewFactory,
        cx: ViewContext<'a>,
    ) -> Self {
        Self {
            inner: Rc::new(MapInner {
                node,
                selector,
                value,
                cx,
                cache: OnceCell::new(),
            }),
        }
    }

    /// The underlying object node.
    pub fn node(&self) -> Node<'a> {
        self.inner.node
    }

    fn key_matches(&self, key: &str) -> bool {
        self.inner.selector.matches(key)
    }

    /// Matching keys, in document order, read without materializing.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .node
            .entries()
            .into_iter()
            .map(|(key, _)| key.text().to_string())
            .filter(|key| self.key_matches(key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// All matching entries, materialized, in document order.
    pub fn entries(&self) -> Result<&[(String, TypedValue<'a>)], ViewError> {
        self.inner
            .cache
            .get_or_try_init(|| {
                self.inner
                    .node
                    .entries()
                    .into_iter()
                    .filter(|(key, _)| self.key_matches(key.text()))
                    .map(|(key, value)| {
                        Ok((
                            key.text().to_string(),
                            build(self.inner.value, value, self.inner.cx)?,
                        ))
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }

    /// The entry named `key`, or `Absent` when no matching key exists.
    pub fn get(&self, key: &str) -> Result<TypedValue<'a>, ViewError> {
        Ok(self
            .entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(TypedValue::Absent))
    }
}

impl<'a> fmt::Debug for MapView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapView({:?})", self.inner.node)
    }
}

/// A lazy object view: one cached accessor per declared property, with
/// transparent `$ref` dereferencing.
#[derive(Clone)]
pub struct ObjectView<'a> {
    inner: Rc<ObjectInner<'a>>,
}

struct ObjectInner<'a> {
    node: Node<'a>,
    def: &'a ObjectFactory,
    cx: ViewContext<'a>,
    resolved: OnceCell<Node<'a>>,
    cache: RefCell<HashMap<String, TypedValue<'a>>>,
}

impl<'a> ObjectView<'a> {
    pub(crate) fn new(node: Node<'a>, def: &'a ObjectFactory, cx: ViewContext<'a>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                node,
                def,
                cx,
                resolved: OnceCell::new(),
                cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The name of the shape this view was materialized for.
    pub fn type_name(&self) -> &str {
        self.inner.def.name()
    }

    /// The original document node — the reference object itself when this
    /// view sits on a `$ref`.
    pub fn node(&self) -> Node<'a> {
        self.inner.node
    }

    /// Whether the underlying node is a reference object.
    pub fn is_ref(&self) -> bool {
        self.inner.node.is_ref()
    }

    /// The `$ref` pointer text, when the underlying node is a reference.
    pub fn ref_string(&self) -> Option<String> {
        if self.is_ref() {
            Some(self.inner.node.get("$ref").text().to_string())
        } else {
            None
        }
    }

    /// The node accessors actually read: the `$ref` target for references,
    /// the node itself otherwise. Resolution happens once, lazily.
    pub fn resolved_node(&self) -> Result<Node<'a>, ViewError> {
        self.inner
            .resolved
            .get_or_try_init(|| {
                let node = self.inner.node;
                if !node.is_ref() {
                    return Ok(node);
                }
                let target = node.resolve()?;
                if target.is_missing() {
                    return Err(ViewError::UnresolvedRef {
                        reference: node.get("$ref").text().to_string(),
                    });
                }
                Ok(target)
            })
            .copied()
    }

    /// Force reference resolution, failing on an unresolvable target.
    pub fn resolve(&self) -> Result<&Self, ViewError> {
        self.resolved_node()?;
        Ok(self)
    }

    /// Declared accessor names, in declaration order.
    pub fn accessors(&self) -> impl Iterator<Item = &str> {
        self.inner.def.accessors()
    }

    /// Materialize one accessor. Computed once and cached; absent or null
    /// properties yield `Absent`.
    pub fn get(&self, accessor: &str) -> Result<TypedValue<'a>, ViewError> {
        if let Some(value) = self.inner.cache.borrow().get(accessor) {
            return Ok(value.clone());
        }

        let (index, binding) =
            self.inner
                .def
                .binding(accessor)
                .ok_or_else(|| ViewError::UnknownAccessor {
                    name: self.inner.def.name().to_string(),
                    accessor: accessor.to_string(),
                })?;
        let target = self.resolved_node()?;
        let value = match &binding.target {
            BindingTarget::Key { key, factory } => build(factory, target.get(key), self.inner.cx)?,
            BindingTarget::Pattern { factory, .. } => TypedValue::Map(MapView::routed(
                target,
                self.inner.def,
                index,
                factory,
                self.inner.cx,
            )),
        };

        self.inner
            .cache
            .borrow_mut()
            .insert(accessor.to_string(), value.clone());
        Ok(value)
    }
}

impl<'a> fmt::Debug for ObjectView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectView<{}>({:?})", self.type_name(), self.inner.node)
    }
}
