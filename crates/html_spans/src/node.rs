//! Index-addressed node arena.
//!
//! Nodes live in a `Document` pool and refer to each other by handle; detach
//! and append are index rewrites, so unwrapping a parsed forest never leaves
//! dangling parents. Handles stay valid for the lifetime of the `Document`
//! whether or not the node is attached.

use crate::atom::{AtomId, AtomTable};
use crate::tag::Tag;
use crate::token::Attribute;

/// Stable per-node identity within one `Document`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u32);

impl NodeHandle {
    /// Reserved sentinel: "no node". Usable as a span-map key.
    pub const NONE: NodeHandle = NodeHandle(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
}

/// Element namespace; `Html` plays the role of the empty namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn is_foreign(self) -> bool {
        self != Namespace::Html
    }
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    tag: Option<Tag>,
    name: Option<AtomId>,
    namespace: Namespace,
    attrs: Vec<Attribute>,
    text: String,
    parent: NodeHandle,
    first_child: NodeHandle,
    last_child: NodeHandle,
    prev_sibling: NodeHandle,
    next_sibling: NodeHandle,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            name: None,
            namespace: Namespace::Html,
            attrs: Vec::new(),
            text: String::new(),
            parent: NodeHandle::NONE,
            first_child: NodeHandle::NONE,
            last_child: NodeHandle::NONE,
            prev_sibling: NodeHandle::NONE,
            next_sibling: NodeHandle::NONE,
        }
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    atoms: AtomTable,
}

impl Document {
    /// Fresh document with a single document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
            atoms: AtomTable::new(),
        }
    }

    pub fn document(&self) -> NodeHandle {
        NodeHandle(0)
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut AtomTable {
        &mut self.atoms
    }

    fn push(&mut self, data: NodeData) -> NodeHandle {
        debug_assert!(self.nodes.len() < NodeHandle::NONE.index(), "arena full");
        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(data);
        handle
    }

    /// Element with tag identity derived from `name`.
    pub fn create_element(&mut self, name: &str) -> NodeHandle {
        let atom = self.atoms.intern_ascii_lowercase(name);
        let tag = Tag::lookup(self.atoms.resolve(atom));
        self.create_element_node(tag, atom, Namespace::Html, Vec::new())
    }

    /// Element with caller-supplied tag identity.
    ///
    /// Callers materializing nodes from an external source provide the tag
    /// themselves; `parse_fragment_with_spans` verifies the identity is
    /// consistent with the textual name before using such a node as context.
    pub fn create_element_parts(&mut self, tag: Option<Tag>, name: &str) -> NodeHandle {
        let atom = self.atoms.intern_ascii_lowercase(name);
        self.create_element_node(tag, atom, Namespace::Html, Vec::new())
    }

    pub(crate) fn create_element_node(
        &mut self,
        tag: Option<Tag>,
        name: AtomId,
        namespace: Namespace,
        attrs: Vec<Attribute>,
    ) -> NodeHandle {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = tag;
        data.name = Some(name);
        data.namespace = namespace;
        data.attrs = attrs;
        self.push(data)
    }

    pub fn create_text(&mut self, text: &str) -> NodeHandle {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = text.to_string();
        self.push(data)
    }

    pub fn create_comment(&mut self, text: &str) -> NodeHandle {
        let mut data = NodeData::new(NodeKind::Comment);
        data.text = text.to_string();
        self.push(data)
    }

    pub fn kind(&self, node: NodeHandle) -> NodeKind {
        self.data(node).kind
    }

    pub fn tag(&self, node: NodeHandle) -> Option<Tag> {
        self.data(node).tag
    }

    pub fn tag_name(&self, node: NodeHandle) -> Option<&str> {
        self.data(node).name.map(|atom| self.atoms.resolve(atom))
    }

    pub fn namespace(&self, node: NodeHandle) -> Namespace {
        self.data(node).namespace
    }

    pub fn text(&self, node: NodeHandle) -> Option<&str> {
        let data = self.data(node);
        match data.kind {
            NodeKind::Text | NodeKind::Comment => Some(&data.text),
            _ => None,
        }
    }

    pub fn attrs(&self, node: NodeHandle) -> &[Attribute] {
        &self.data(node).attrs
    }

    /// Attribute value by (lowercase) name; `None` for missing or valueless.
    pub fn attr<'a>(&'a self, node: NodeHandle, name: &str) -> Option<&'a str> {
        let atom = self.atoms.get(name)?;
        self.data(node)
            .attrs
            .iter()
            .find(|attr| attr.name == atom)
            .and_then(|attr| attr.value.as_deref())
    }

    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        link(self.data(node).parent)
    }

    pub fn first_child(&self, node: NodeHandle) -> Option<NodeHandle> {
        link(self.data(node).first_child)
    }

    pub fn last_child(&self, node: NodeHandle) -> Option<NodeHandle> {
        link(self.data(node).last_child)
    }

    pub fn prev_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        link(self.data(node).prev_sibling)
    }

    pub fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        link(self.data(node).next_sibling)
    }

    pub fn children(&self, node: NodeHandle) -> Children<'_> {
        Children {
            doc: self,
            next: self.data(node).first_child,
        }
    }

    /// Append a detached node as `parent`'s last child.
    pub fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        debug_assert!(
            self.data(child).parent.is_none(),
            "append_child requires a detached node"
        );
        debug_assert!(
            matches!(self.data(parent).kind, NodeKind::Document | NodeKind::Element),
            "only documents and elements take children"
        );
        let old_last = self.data(parent).last_child;
        if old_last.is_none() {
            self.nodes[parent.index()].first_child = child;
        } else {
            self.nodes[old_last.index()].next_sibling = child;
        }
        let data = &mut self.nodes[child.index()];
        data.parent = parent;
        data.prev_sibling = old_last;
        self.nodes[parent.index()].last_child = child;
    }

    /// Sever `node` from its parent and siblings; ownership of the subtree
    /// transfers to the caller, links of remaining siblings are rewired.
    pub fn detach(&mut self, node: NodeHandle) {
        let (parent, prev, next) = {
            let data = self.data(node);
            (data.parent, data.prev_sibling, data.next_sibling)
        };
        if parent.is_none() {
            return;
        }
        if prev.is_none() {
            self.nodes[parent.index()].first_child = next;
        } else {
            self.nodes[prev.index()].next_sibling = next;
        }
        if next.is_none() {
            self.nodes[parent.index()].last_child = prev;
        } else {
            self.nodes[next.index()].prev_sibling = prev;
        }
        let data = &mut self.nodes[node.index()];
        data.parent = NodeHandle::NONE;
        data.prev_sibling = NodeHandle::NONE;
        data.next_sibling = NodeHandle::NONE;
    }

    pub(crate) fn append_text(&mut self, node: NodeHandle, more: &str) {
        debug_assert!(self.data(node).kind == NodeKind::Text);
        self.nodes[node.index()].text.push_str(more);
    }

    fn data(&self, node: NodeHandle) -> &NodeData {
        &self.nodes[node.index()]
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn link(handle: NodeHandle) -> Option<NodeHandle> {
    (!handle.is_none()).then_some(handle)
}

pub struct Children<'a> {
    doc: &'a Document,
    next: NodeHandle,
}

impl Iterator for Children<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let current = link(self.next)?;
        self.next = self.doc.data(current).next_sibling;
        Some(current)
    }
}
