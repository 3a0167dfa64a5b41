//! XPath evaluation against a [`Document`]

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::{Document, NodeId, NodeKind, NodeRef, QName, XML_NS};
use crate::xpath::node_set::NodeSet;
use crate::xpath::parser::{compile, Axis, Expr, LocationPath, NodeTest};

/// Evaluation context: a document plus the namespace bindings used to
/// resolve prefixed names in expressions
#[derive(Debug)]
pub struct XPathContext<'d> {
    document: &'d Document,
    namespaces: IndexMap<String, String>,
}

impl<'d> XPathContext<'d> {
    /// Context with only the `xml` prefix bound
    pub fn new(document: &'d Document) -> Self {
        let mut namespaces = IndexMap::new();
        namespaces.insert("xml".to_string(), XML_NS.to_string());
        Self {
            document,
            namespaces,
        }
    }

    /// Context with every `(prefix, uri)` pair registered
    pub fn with_bindings(document: &'d Document, bindings: &[(&str, &str)]) -> Result<Self> {
        let mut context = Self::new(document);
        for (prefix, uri) in bindings {
            context.register_namespace(prefix, uri)?;
        }
        Ok(context)
    }

    pub fn register_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if prefix.is_empty() || uri.is_empty() {
            return Err(Error::with_message(
                ErrorKind::XPathContext,
                Span::empty(),
                format!("unable to register namespace '{prefix}' = '{uri}'"),
            ));
        }
        match self.namespaces.get(prefix) {
            Some(existing) if existing != uri => Err(Error::with_message(
                ErrorKind::XPathContext,
                Span::empty(),
                format!("prefix '{prefix}' is already bound to '{existing}'"),
            )),
            _ => {
                self.namespaces.insert(prefix.to_string(), uri.to_string());
                Ok(())
            }
        }
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    pub const fn document(&self) -> &'d Document {
        self.document
    }

    /// Compile and evaluate `expression`
    pub fn evaluate(&self, expression: &str) -> Result<NodeSet> {
        let expr = compile(expression)?;
        self.evaluate_compiled(&expr)
    }

    /// Evaluate a compiled expression; the context node is the document node
    pub fn evaluate_compiled(&self, expr: &Expr) -> Result<NodeSet> {
        let paths = expr
            .paths
            .iter()
            .map(|path| self.resolve(path))
            .collect::<Result<Vec<_>>>()?;

        let order = DocumentOrder::new(self.document);
        let mut result = Vec::new();
        for path in &paths {
            result.extend(self.eval_path(path, &order));
        }
        order.sort_dedup(&mut result);
        Ok(NodeSet::from_sorted(result))
    }

    fn resolve(&self, path: &LocationPath) -> Result<Vec<ResolvedStep>> {
        path.steps
            .iter()
            .map(|step| {
                let test = match &step.test {
                    NodeTest::AnyName => Test::AnyName,
                    NodeTest::NamespaceAny { prefix } => Test::Namespace(self.lookup(prefix)?),
                    NodeTest::Name { prefix, local } => Test::Name {
                        namespace: prefix.as_deref().map(|p| self.lookup(p)).transpose()?,
                        local: local.clone(),
                    },
                    NodeTest::Node => Test::Node,
                    NodeTest::Text => Test::Text,
                    NodeTest::Comment => Test::Comment,
                    NodeTest::ProcessingInstruction => Test::ProcessingInstruction,
                };
                Ok(ResolvedStep {
                    axis: step.axis,
                    test,
                })
            })
            .collect()
    }

    fn lookup(&self, prefix: &str) -> Result<String> {
        self.namespace(prefix).map(str::to_string).ok_or_else(|| {
            Error::new(
                ErrorKind::XPathUnboundPrefix {
                    prefix: prefix.to_string(),
                },
                Span::empty(),
            )
        })
    }

    fn eval_path(&self, steps: &[ResolvedStep], order: &DocumentOrder) -> Vec<NodeRef> {
        let mut current = vec![NodeRef::Node(self.document.root())];
        for step in steps {
            let mut next = Vec::new();
            let mut candidates = Vec::new();
            for &node in &current {
                candidates.clear();
                self.collect_axis(node, step.axis, &mut candidates);
                next.extend(
                    candidates
                        .iter()
                        .copied()
                        .filter(|&candidate| self.matches(candidate, step)),
                );
            }
            order.sort_dedup(&mut next);
            current = next;
        }
        current
    }

    fn collect_axis(&self, node: NodeRef, axis: Axis, out: &mut Vec<NodeRef>) {
        let doc = self.document;
        let id = match node {
            NodeRef::Node(id) => id,
            NodeRef::Attribute(attr) => {
                let Some(owner) = doc.attribute(attr).map(|a| a.owner) else {
                    return;
                };
                match axis {
                    Axis::SelfAxis => out.push(node),
                    Axis::Parent => out.push(owner.into()),
                    Axis::Ancestor => self.push_ancestors(owner, true, out),
                    Axis::AncestorOrSelf => {
                        out.push(node);
                        self.push_ancestors(owner, true, out);
                    }
                    _ => {}
                }
                return;
            }
        };

        match axis {
            Axis::Child => out.extend(doc.children(id).iter().map(|&c| NodeRef::Node(c))),
            Axis::Descendant => out.extend(doc.descendants(id).map(NodeRef::Node)),
            Axis::DescendantOrSelf => {
                out.push(node);
                out.extend(doc.descendants(id).map(NodeRef::Node));
            }
            Axis::SelfAxis => out.push(node),
            Axis::Parent => out.extend(doc.parent(id).map(NodeRef::Node)),
            Axis::Ancestor => self.push_ancestors(id, false, out),
            Axis::AncestorOrSelf => self.push_ancestors(id, true, out),
            Axis::Attribute => {
                out.extend(doc.attributes(id).iter().map(|&a| NodeRef::Attribute(a)));
            }
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = doc.parent(id) else {
                    return;
                };
                let siblings = doc.children(parent);
                let Some(at) = siblings.iter().position(|&s| s == id) else {
                    return;
                };
                let (before, after) = siblings.split_at(at);
                let chosen = if axis == Axis::FollowingSibling {
                    after.get(1..).unwrap_or_default()
                } else {
                    before
                };
                out.extend(chosen.iter().map(|&s| NodeRef::Node(s)));
            }
        }
    }

    fn push_ancestors(&self, id: NodeId, include_self: bool, out: &mut Vec<NodeRef>) {
        if include_self {
            out.push(id.into());
        }
        let mut current = self.document.parent(id);
        while let Some(parent) = current {
            out.push(parent.into());
            current = self.document.parent(parent);
        }
    }

    fn matches(&self, node: NodeRef, step: &ResolvedStep) -> bool {
        if step.test == Test::Node {
            return true;
        }
        match node {
            NodeRef::Attribute(id) => {
                step.axis == Axis::Attribute
                    && self
                        .document
                        .attribute(id)
                        .is_some_and(|attr| step.test.matches_name(&attr.name))
            }
            NodeRef::Node(id) => match self.document.kind(id) {
                Some(NodeKind::Element(element)) => {
                    step.axis != Axis::Attribute && step.test.matches_name(&element.name)
                }
                Some(NodeKind::Text(_) | NodeKind::CData(_)) => step.test == Test::Text,
                Some(NodeKind::Comment(_)) => step.test == Test::Comment,
                Some(NodeKind::ProcessingInstruction { .. }) => {
                    step.test == Test::ProcessingInstruction
                }
                Some(NodeKind::Root) | None => false,
            },
        }
    }
}

/// Node test with prefixes replaced by namespace URIs
#[derive(Clone, Debug, PartialEq, Eq)]
enum Test {
    AnyName,
    Namespace(String),
    Name {
        namespace: Option<String>,
        local: String,
    },
    Node,
    Text,
    Comment,
    ProcessingInstruction,
}

impl Test {
    fn matches_name(&self, name: &QName) -> bool {
        match self {
            Self::AnyName => true,
            Self::Namespace(uri) => name.namespace() == Some(uri.as_str()),
            Self::Name { namespace, local } => {
                name.namespace() == namespace.as_deref() && name.local_name() == local
            }
            Self::Node | Self::Text | Self::Comment | Self::ProcessingInstruction => false,
        }
    }
}

#[derive(Debug)]
struct ResolvedStep {
    axis: Axis,
    test: Test,
}

/// Position of every attached node and attribute in document order
#[derive(Debug)]
struct DocumentOrder {
    positions: HashMap<NodeRef, usize>,
}

impl DocumentOrder {
    fn new(doc: &Document) -> Self {
        let mut positions = HashMap::new();
        positions.insert(NodeRef::Node(doc.root()), 0);
        for id in doc.descendants(doc.root()) {
            let next = positions.len();
            positions.insert(NodeRef::Node(id), next);
            for &attr in doc.attributes(id) {
                let next = positions.len();
                positions.insert(NodeRef::Attribute(attr), next);
            }
        }
        Self { positions }
    }

    fn position(&self, node: NodeRef) -> usize {
        self.positions.get(&node).copied().unwrap_or(usize::MAX)
    }

    fn sort_dedup(&self, nodes: &mut Vec<NodeRef>) {
        nodes.sort_by_key(|&node| self.position(node));
        nodes.dedup();
    }
}
