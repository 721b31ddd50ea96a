//! Structured-document access layer.
//!
//! Rule checks never touch raw text. They consume a [`Node`] tree in which
//! every node carries the line and column it originated from, through a fixed
//! capability set: [`Node::get`], [`Node::line`], [`Node::children`]. The tree
//! is built from the marked event stream of the underlying YAML parser
//! (`yaml-rust2`), which is the component that owns source positions.
//!
//! # Example
//!
//! ```rust,ignore
//! use playlint::parser::parse_document;
//!
//! let doc = parse_document("- name: Install nginx\n  apt:\n    name: nginx\n")?;
//! let task = &doc.items()[0];
//! assert_eq!(task.get("name").and_then(|n| n.as_str()), Some("Install nginx"));
//! assert_eq!(task.line(), 1);
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

/// Error raised while building a document tree.
///
/// Not part of the fatal error taxonomy: an unparseable candidate is skipped
/// with a reason, the scan itself continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The underlying YAML scanner rejected the input.
    #[error("YAML syntax error: {0}")]
    Syntax(String),

    /// A mapping key was itself a collection.
    #[error("mapping key at line {line} is not a scalar")]
    NonScalarKey {
        /// 1-indexed source line of the offending key
        line: usize,
    },
}

/// The shape of a parsed node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// A scalar leaf, stored as its string form.
    Scalar(String),
    /// An ordered sequence of nodes.
    Sequence(Vec<Node>),
    /// A key-ordered mapping from scalar keys to nodes.
    Mapping(IndexMap<String, Node>),
}

/// A parsed document node annotated with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: NodeValue,
    line: usize,
    column: usize,
}

impl Node {
    /// Create a scalar node.
    pub fn scalar(value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            value: NodeValue::Scalar(value.into()),
            line,
            column,
        }
    }

    /// Create a sequence node.
    pub fn sequence(items: Vec<Node>, line: usize, column: usize) -> Self {
        Self {
            value: NodeValue::Sequence(items),
            line,
            column,
        }
    }

    /// Create a mapping node.
    pub fn mapping(entries: IndexMap<String, Node>, line: usize, column: usize) -> Self {
        Self {
            value: NodeValue::Mapping(entries),
            line,
            column,
        }
    }

    /// 1-indexed source line this node starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-indexed source column this node starts on.
    pub fn column(&self) -> usize {
        self.column
    }

    /// The underlying value shape.
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Look up a key in a mapping node. Returns `None` for other shapes.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.value {
            NodeValue::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Whether a mapping node contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Child nodes: sequence items, or mapping values in key order.
    /// Scalars have no children.
    pub fn children(&self) -> Vec<&Node> {
        match &self.value {
            NodeValue::Scalar(_) => Vec::new(),
            NodeValue::Sequence(items) => items.iter().collect(),
            NodeValue::Mapping(entries) => entries.values().collect(),
        }
    }

    /// Sequence items, or an empty slice for other shapes.
    pub fn items(&self) -> &[Node] {
        match &self.value {
            NodeValue::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Iterate over mapping entries in key order. Empty for other shapes.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        let entries = match &self.value {
            NodeValue::Mapping(entries) => Some(entries),
            _ => None,
        };
        entries
            .into_iter()
            .flat_map(|e| e.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Scalar string value, if this is a scalar node.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Interpret a scalar as a boolean using YAML truthiness conventions.
    pub fn as_bool(&self) -> Option<bool> {
        let s = self.as_str()?;
        match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Some(true),
            "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    /// Whether this node is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self.value, NodeValue::Mapping(_))
    }

    /// Whether this node is a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self.value, NodeValue::Sequence(_))
    }

    /// Whether this node is a scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self.value, NodeValue::Scalar(_))
    }

    /// Whether this node is an empty scalar, sequence or mapping.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            NodeValue::Scalar(s) => s.is_empty() || s == "~" || s == "null",
            NodeValue::Sequence(items) => items.is_empty(),
            NodeValue::Mapping(entries) => entries.is_empty(),
        }
    }
}

/// Parse a YAML document into a position-annotated [`Node`] tree.
///
/// Multi-document streams keep the first document; an empty stream yields an
/// empty scalar node at line 1.
pub fn parse_document(text: &str) -> Result<Node, DocumentError> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new_from_str(text);
    parser
        .load(&mut builder, true)
        .map_err(|e| DocumentError::Syntax(e.to_string()))?;

    if let Some(err) = builder.error {
        return Err(err);
    }

    Ok(builder
        .docs
        .into_iter()
        .next()
        .unwrap_or_else(|| Node::scalar("", 1, 1)))
}

/// One partially built collection on the event stack.
enum Frame {
    Sequence {
        items: Vec<Node>,
        line: usize,
        column: usize,
        anchor: usize,
    },
    Mapping {
        entries: IndexMap<String, Node>,
        pending_key: Option<String>,
        line: usize,
        column: usize,
        anchor: usize,
    },
}

/// Builds the node tree from the parser's marked event stream.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    docs: Vec<Node>,
    anchors: HashMap<usize, Node>,
    error: Option<DocumentError>,
}

impl TreeBuilder {
    fn record_anchor(&mut self, anchor: usize, node: &Node) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
    }

    fn push_value(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => match pending_key.take() {
                Some(key) => {
                    entries.insert(key, node);
                }
                None => match node.as_str() {
                    Some(key) => *pending_key = Some(key.to_string()),
                    None => {
                        self.error = Some(DocumentError::NonScalarKey { line: node.line() });
                    }
                },
            },
            None => self.docs.push(node),
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }

        // Marker columns are 0-indexed; the node contract is 1-indexed.
        let line = mark.line();
        let column = mark.col() + 1;

        match ev {
            Event::Scalar(value, _, anchor, _) => {
                let node = Node::scalar(value, line, column);
                self.record_anchor(anchor, &node);
                self.push_value(node);
            }
            Event::SequenceStart(anchor, _) => {
                self.stack.push(Frame::Sequence {
                    items: Vec::new(),
                    line,
                    column,
                    anchor,
                });
            }
            Event::SequenceEnd => {
                if let Some(Frame::Sequence {
                    items,
                    line,
                    column,
                    anchor,
                }) = self.stack.pop()
                {
                    let node = Node::sequence(items, line, column);
                    self.record_anchor(anchor, &node);
                    self.push_value(node);
                }
            }
            Event::MappingStart(anchor, _) => {
                self.stack.push(Frame::Mapping {
                    entries: IndexMap::new(),
                    pending_key: None,
                    line,
                    column,
                    anchor,
                });
            }
            Event::MappingEnd => {
                if let Some(Frame::Mapping {
                    entries,
                    line,
                    column,
                    anchor,
                    ..
                }) = self.stack.pop()
                {
                    let node = Node::mapping(entries, line, column);
                    self.record_anchor(anchor, &node);
                    self.push_value(node);
                }
            }
            Event::Alias(anchor) => {
                let node = self
                    .anchors
                    .get(&anchor)
                    .cloned()
                    .unwrap_or_else(|| Node::scalar("", line, column));
                self.push_value(node);
            }
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}
        }
    }
}
