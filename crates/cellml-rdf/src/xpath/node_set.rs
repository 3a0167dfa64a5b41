//! Ordered node sets returned by XPath evaluation

use crate::xml::{AttrId, NodeId, NodeRef};

/// Duplicate-free sequence of node handles in document order.
///
/// The set does not own the nodes; the handles stay meaningful only for the
/// document the set was evaluated against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: Vec<NodeRef>,
}

impl NodeSet {
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Wrap nodes that are already sorted and deduplicated
    pub(crate) const fn from_sorted(nodes: Vec<NodeRef>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeRef> {
        self.nodes.get(index).copied()
    }

    pub fn first(&self) -> Option<NodeRef> {
        self.nodes.first().copied()
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.nodes.iter().copied()
    }

    /// Element and other tree-node handles, skipping attributes
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter_map(NodeRef::as_node)
    }

    /// Attribute handles, skipping tree nodes
    pub fn attributes(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.iter().filter_map(NodeRef::as_attribute)
    }

    pub fn as_slice(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<NodeRef> {
        self.nodes
    }
}

impl IntoIterator for NodeSet {
    type Item = NodeRef;
    type IntoIter = std::vec::IntoIter<NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = NodeRef;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeRef>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}
