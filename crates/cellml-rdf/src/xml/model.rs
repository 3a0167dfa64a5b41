//! XML data model
//!
//! A [`Document`] owns every node in two arenas: one for tree nodes and one
//! for attributes. Callers hold [`NodeId`] / [`AttrId`] handles and go through
//! the document for every read and every mutation.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Handle to a tree node owned by a [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle to an attribute owned by a [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(usize);

impl AttrId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Any addressable node, as produced by XPath evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeId),
    Attribute(AttrId),
}

impl NodeRef {
    pub const fn as_node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::Attribute(_) => None,
        }
    }

    pub const fn as_attribute(self) -> Option<AttrId> {
        match self {
            Self::Attribute(id) => Some(id),
            Self::Node(_) => None,
        }
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<AttrId> for NodeRef {
    fn from(id: AttrId) -> Self {
        Self::Attribute(id)
    }
}

/// Namespace-resolved name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QName {
    prefix: Option<String>,
    local: String,
    namespace: Option<String>,
}

impl QName {
    pub fn new(prefix: Option<&str>, local: &str, namespace: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            namespace: namespace.map(str::to_string),
        }
    }

    /// Name without prefix or namespace
    pub fn local(local: &str) -> Self {
        Self::new(None, local, None)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Name as written in the source, `prefix:local` or `local`
    pub fn lexical(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }

    /// Expanded-name comparison
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }
}

/// XML element payload
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: QName,
    /// Namespace declarations made on this element, prefix to URI; the
    /// default namespace uses the empty prefix
    pub namespaces: IndexMap<String, String>,
    pub attributes: Vec<AttrId>,
}

/// XML attribute
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
    pub owner: NodeId,
}

/// Node payload
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// The document node; parent of the root element and of prolog/epilog
    /// comments and processing instructions
    Root,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// XML document
#[derive(Clone, Debug)]
pub struct Document {
    locator: Option<String>,
    nodes: Vec<NodeData>,
    attributes: Vec<Attribute>,
}

const ROOT: NodeId = NodeId(0);

impl Default for Document {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Document {
    /// Create an empty document with only a document node
    pub fn new(locator: Option<String>) -> Self {
        Self {
            locator,
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            attributes: Vec::new(),
        }
    }

    /// File path or URI identifying this document
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn set_locator(&mut self, locator: Option<String>) {
        self.locator = locator;
    }

    /// The document node
    pub const fn root(&self) -> NodeId {
        ROOT
    }

    /// First element child of the document node
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(ROOT)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Attribute handles of an element, in source order
    pub fn attributes(&self, id: NodeId) -> &[AttrId] {
        self.element(id)
            .map(|element| element.attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn attribute(&self, id: AttrId) -> Option<&Attribute> {
        self.attributes.get(id.0)
    }

    pub fn attribute_value(&self, id: AttrId) -> Option<&str> {
        self.attribute(id).map(|attr| attr.value.as_str())
    }

    /// Find an attribute on `element` by expanded name
    pub fn find_attribute(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local: &str,
    ) -> Option<AttrId> {
        self.attributes(element).iter().copied().find(|&id| {
            self.attribute(id).is_some_and(|attr| {
                attr.name.namespace() == namespace && attr.name.local_name() == local
            })
        })
    }

    /// Whether `id` is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ROOT {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Descendants of `id` in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// XPath string-value of a node
    pub fn string_value(&self, node: NodeRef) -> String {
        match node {
            NodeRef::Attribute(id) => self.attribute_value(id).unwrap_or_default().to_string(),
            NodeRef::Node(id) => match self.kind(id) {
                Some(NodeKind::Text(text) | NodeKind::CData(text) | NodeKind::Comment(text)) => {
                    text.clone()
                }
                Some(NodeKind::ProcessingInstruction { data, .. }) => data.clone(),
                Some(NodeKind::Root | NodeKind::Element(_)) => self
                    .descendants(id)
                    .filter_map(|child| match self.kind(child) {
                        Some(NodeKind::Text(text) | NodeKind::CData(text)) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect(),
                None => String::new(),
            },
        }
    }

    /// Namespace bindings in scope at `id`, outermost declaration first;
    /// inner declarations override outer ones
    pub fn in_scope_namespaces(&self, id: NodeId) -> IndexMap<String, String> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }

        let mut scope = IndexMap::new();
        for node in chain.into_iter().rev() {
            if let Some(element) = self.element(node) {
                for (prefix, uri) in &element.namespaces {
                    scope.insert(prefix.clone(), uri.clone());
                }
            }
        }
        scope
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.push_node(NodeKind::Element(Element {
            name,
            namespaces: IndexMap::new(),
            attributes: Vec::new(),
        }))
    }

    /// Create a detached leaf node; `Root` and `Element` kinds are rejected
    pub fn create_leaf(&mut self, kind: NodeKind) -> Result<NodeId> {
        match kind {
            NodeKind::Root | NodeKind::Element(_) => {
                Err(Error::invalid_node("create_leaf only accepts leaf node kinds"))
            }
            leaf => Ok(self.push_node(leaf)),
        }
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !matches!(
            self.kind(parent),
            Some(NodeKind::Root | NodeKind::Element(_))
        ) {
            return Err(Error::invalid_node(format!(
                "node {} cannot have children",
                parent.0
            )));
        }
        if child == ROOT || self.parent(child).is_some() || self.kind(child).is_none() {
            return Err(Error::invalid_node(format!(
                "node {} is not a detached node",
                child.0
            )));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::invalid_node("cannot append a node beneath itself"));
        }

        if let Some(node) = self.nodes.get_mut(child.0) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Declare `prefix` (empty for the default namespace) on an element
    pub fn declare_namespace(&mut self, element: NodeId, prefix: &str, uri: &str) -> Result<()> {
        let element = self.element_mut(element)?;
        element
            .namespaces
            .insert(prefix.to_string(), uri.to_string());
        Ok(())
    }

    /// Add an attribute to an element
    pub fn add_attribute(&mut self, element: NodeId, name: QName, value: &str) -> Result<AttrId> {
        let id = AttrId(self.attributes.len());
        self.element_mut(element)?.attributes.push(id);
        self.attributes.push(Attribute {
            name,
            value: value.to_string(),
            owner: element,
        });
        Ok(id)
    }

    /// Replace the value of an attribute
    pub fn set_attribute_value(&mut self, id: AttrId, value: &str) -> Result<()> {
        let attr = self
            .attributes
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_node(format!("no attribute {}", id.0)))?;
        attr.value = value.to_string();
        Ok(())
    }

    /// Replace the content of a node: the value of an attribute, the text of
    /// a character-data node, or all children of an element with one text node
    pub fn set_content(&mut self, node: NodeRef, value: &str) -> Result<()> {
        let id = match node {
            NodeRef::Attribute(id) => return self.set_attribute_value(id, value),
            NodeRef::Node(id) => id,
        };

        if self.element(id).is_some() {
            let old = self
                .nodes
                .get_mut(id.0)
                .map(|node| std::mem::take(&mut node.children))
                .unwrap_or_default();
            for child in old {
                if let Some(node) = self.nodes.get_mut(child.0) {
                    node.parent = None;
                }
            }
            let text = self.push_node(NodeKind::Text(value.to_string()));
            return self.append_child(id, text);
        }

        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_node(format!("no node {}", id.0)))?;
        match &mut node.kind {
            NodeKind::Text(text) | NodeKind::CData(text) | NodeKind::Comment(text) => {
                *text = value.to_string();
                Ok(())
            }
            NodeKind::ProcessingInstruction { data, .. } => {
                *data = value.to_string();
                Ok(())
            }
            NodeKind::Root | NodeKind::Element(_) => {
                Err(Error::invalid_node("cannot set content of the document node"))
            }
        }
    }

    /// Detach `id` and its subtree from the tree. Detaching an already
    /// detached node is a no-op.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        if id == ROOT {
            return Err(Error::invalid_node("cannot remove the document node"));
        }
        let parent = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_node(format!("no node {}", id.0)))?
            .parent
            .take();
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent.0) {
                node.children.retain(|&child| child != id);
            }
        }
        Ok(())
    }

    /// Deep-copy the subtree rooted at `id` in `source` into this document,
    /// returning the detached copy
    pub fn import_subtree(&mut self, source: &Self, id: NodeId) -> Result<NodeId> {
        let kind = source
            .kind(id)
            .ok_or_else(|| Error::invalid_node(format!("no node {}", id.0)))?;

        let copy = match kind {
            NodeKind::Root => return Err(Error::invalid_node("cannot import the document node")),
            NodeKind::Element(element) => {
                let copy = self.create_element(element.name.clone());
                for (prefix, uri) in &element.namespaces {
                    self.declare_namespace(copy, prefix, uri)?;
                }
                for &attr in &element.attributes {
                    if let Some(attr) = source.attribute(attr) {
                        self.add_attribute(copy, attr.name.clone(), &attr.value)?;
                    }
                }
                copy
            }
            leaf => self.push_node(leaf.clone()),
        };

        for &child in source.children(id) {
            let child_copy = self.import_subtree(source, child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Drop whitespace-only text children of `id` when it has no other text
    pub(crate) fn prune_blank_text(&mut self, id: NodeId) {
        let is_blank = |kind: Option<&NodeKind>| {
            matches!(kind, Some(NodeKind::Text(text)) if text.trim().is_empty())
        };
        let has_text = self.children(id).iter().any(|&child| {
            matches!(self.kind(child), Some(NodeKind::Text(_) | NodeKind::CData(_)))
                && !is_blank(self.kind(child))
        });
        if has_text {
            return;
        }

        let blanks: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&child| is_blank(self.kind(child)))
            .collect();
        for blank in blanks {
            let _ = self.remove_subtree(blank);
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Ok(element),
            _ => Err(Error::invalid_node(format!("node {} is not an element", id.0))),
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

/// Pre-order iterator over the descendants of a node
#[derive(Debug)]
pub struct Descendants<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}
