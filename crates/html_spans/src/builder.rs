//! Tree-construction collaborator.
//!
//! Consumes tokens and mutates the node arena: stack of open elements with
//! scope-aware end-tag matching, a compact insertion-mode state, foreign
//! content namespaces, a form-element pointer, and adjacent-text coalescing.
//! This is a pragmatic subset of WHATWG tree construction; error recovery
//! never fails, it only drops or redirects tokens.

use crate::atom::{AtomId, AtomTable};
use crate::node::{Document, Namespace, NodeHandle, NodeKind};
use crate::tag::{self, Tag};
use crate::token::{Attribute, Token};

/// Insertion mode; the fragment reset derives it from the context element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum InsertionMode {
    #[default]
    InBody,
    InHead,
    InTable,
    InTableBody,
    InRow,
    InCell,
    InSelect,
}

/// Scope classes for end-tag and implied-end-tag matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    InScope,
    Button,
    ListItem,
    Table,
}

fn is_scope_boundary(tag: Option<Tag>, kind: ScopeKind) -> bool {
    let Some(tag) = tag else {
        return false;
    };
    match kind {
        ScopeKind::InScope => matches!(
            tag,
            Tag::Html
                | Tag::Table
                | Tag::Template
                | Tag::Td
                | Tag::Th
                | Tag::Caption
                | Tag::Marquee
                | Tag::Object
                | Tag::Applet
        ),
        ScopeKind::Button => is_scope_boundary(Some(tag), ScopeKind::InScope) || tag == Tag::Button,
        ScopeKind::ListItem => {
            is_scope_boundary(Some(tag), ScopeKind::InScope) || matches!(tag, Tag::Ol | Tag::Ul)
        }
        ScopeKind::Table => matches!(tag, Tag::Html | Tag::Table | Tag::Template),
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenElement {
    node: NodeHandle,
    tag: Option<Tag>,
    name: AtomId,
    namespace: Namespace,
}

#[derive(Debug, Default)]
struct OpenStack {
    items: Vec<OpenElement>,
}

impl OpenStack {
    fn push(&mut self, entry: OpenElement) {
        self.items.push(entry);
    }

    fn top(&self) -> Option<OpenElement> {
        self.items.last().copied()
    }

    fn depth(&self) -> usize {
        self.items.len()
    }

    /// Index of the nearest element matching `name` that is visible in the
    /// requested scope; boundaries hide anything beneath them.
    fn find_in_scope(&self, name: AtomId, kind: ScopeKind) -> Option<usize> {
        for index in (0..self.items.len()).rev() {
            let entry = self.items[index];
            if entry.name == name {
                return Some(index);
            }
            if is_scope_boundary(entry.tag, kind) {
                return None;
            }
        }
        None
    }

    fn find_tag_in_scope(&self, tag: Tag, kind: ScopeKind) -> Option<usize> {
        for index in (0..self.items.len()).rev() {
            let entry = self.items[index];
            if entry.tag == Some(tag) {
                return Some(index);
            }
            if is_scope_boundary(entry.tag, kind) {
                return None;
            }
        }
        None
    }

    /// Pop down to and including `index`, returning the matched element.
    fn pop_through(&mut self, index: usize) -> OpenElement {
        debug_assert!(index < self.items.len());
        self.items.truncate(index + 1);
        self.items.pop().expect("pop_through with valid index")
    }
}

/// Ambient form context survives the whole fragment; a form parsed here is
/// cleared again by its end tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FormPointer {
    Unset,
    Ambient,
    Parsed(NodeHandle),
}

pub(crate) struct TreeBuilder {
    doc: Document,
    root: NodeHandle,
    stack: OpenStack,
    mode: InsertionMode,
    form: FormPointer,
}

impl TreeBuilder {
    /// Builder over a fresh document with a synthetic `html` root as the sole
    /// child of the document node; the open stack starts at the root.
    pub(crate) fn fragment() -> Self {
        let mut doc = Document::new();
        let name = doc.atoms_mut().intern_ascii_lowercase("html");
        let root = doc.create_element_node(Some(Tag::Html), name, Namespace::Html, Vec::new());
        let document = doc.document();
        doc.append_child(document, root);
        let mut stack = OpenStack::default();
        stack.push(OpenElement {
            node: root,
            tag: Some(Tag::Html),
            name,
            namespace: Namespace::Html,
        });
        Self {
            doc,
            root,
            stack,
            mode: InsertionMode::default(),
            form: FormPointer::Unset,
        }
    }

    pub(crate) fn root(&self) -> NodeHandle {
        self.root
    }

    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut AtomTable {
        self.doc.atoms_mut()
    }

    pub(crate) fn into_document(self) -> Document {
        self.doc
    }

    pub(crate) fn set_ambient_form(&mut self) {
        self.form = FormPointer::Ambient;
    }

    /// Fragment-appropriate initial insertion mode, derived from the context
    /// element the way the document algorithm resets from the stack.
    pub(crate) fn reset_insertion_mode(&mut self, context: Option<Tag>) {
        self.mode = match context {
            Some(Tag::Td) | Some(Tag::Th) => InsertionMode::InCell,
            Some(Tag::Tr) => InsertionMode::InRow,
            Some(Tag::Tbody) | Some(Tag::Thead) | Some(Tag::Tfoot) => InsertionMode::InTableBody,
            Some(Tag::Table) | Some(Tag::Caption) | Some(Tag::Colgroup) => InsertionMode::InTable,
            Some(Tag::Select) => InsertionMode::InSelect,
            Some(Tag::Head) => InsertionMode::InHead,
            _ => InsertionMode::InBody,
        };
        log::trace!(target: "html_spans.builder", "insertion mode reset to {:?}", self.mode);
    }

    /// The node the next token most likely affects: the newest child of the
    /// deepest open element, the element itself while it is still childless,
    /// or the sentinel for an empty stack.
    pub(crate) fn span_target(&self) -> NodeHandle {
        match self.stack.top() {
            Some(entry) => self.doc.last_child(entry.node).unwrap_or(entry.node),
            None => NodeHandle::NONE,
        }
    }

    pub(crate) fn top_is_foreign(&self) -> bool {
        self.stack
            .top()
            .is_some_and(|entry| entry.namespace.is_foreign())
    }

    pub(crate) fn consume(&mut self, token: &Token) {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.start_tag(*name, attrs, *self_closing),
            Token::EndTag { name } => self.end_tag(*name),
            Token::Text { text } => self.text(text),
            Token::Comment { text } => self.comment(text),
            Token::Doctype { .. } => {
                log::trace!(target: "html_spans.builder", "doctype ignored in fragment");
            }
            Token::Error => self.end_of_input(),
        }
    }

    fn insertion_parent(&self) -> NodeHandle {
        match self.stack.top() {
            Some(entry) => entry.node,
            None => self.root,
        }
    }

    fn start_tag(&mut self, name: AtomId, attrs: &[Attribute], self_closing: bool) {
        let tag = Tag::lookup(self.doc.atoms().resolve(name));
        if let Some(tag) = tag {
            if tag::closes_p(tag)
                && let Some(index) = self.stack.find_tag_in_scope(Tag::P, ScopeKind::Button)
            {
                self.stack.pop_through(index);
            }
            if tag == Tag::Li
                && let Some(index) = self.stack.find_tag_in_scope(Tag::Li, ScopeKind::ListItem)
            {
                self.stack.pop_through(index);
            }
            if tag == Tag::Form && self.form != FormPointer::Unset {
                log::trace!(target: "html_spans.builder", "form start tag ignored: pointer already set");
                return;
            }
        }
        let parent_ns = self
            .stack
            .top()
            .map(|entry| entry.namespace)
            .unwrap_or_default();
        let namespace = if parent_ns.is_foreign() {
            parent_ns
        } else {
            match tag {
                Some(Tag::Svg) => Namespace::Svg,
                Some(Tag::Math) => Namespace::MathMl,
                _ => Namespace::Html,
            }
        };
        let node = self
            .doc
            .create_element_node(tag, name, namespace, attrs.to_vec());
        let parent = self.insertion_parent();
        self.doc.append_child(parent, node);
        if tag == Some(Tag::Form) && self.form == FormPointer::Unset {
            self.form = FormPointer::Parsed(node);
        }
        let void = namespace == Namespace::Html && tag.is_some_and(tag::is_void);
        if !void && !self_closing {
            self.stack.push(OpenElement {
                node,
                tag,
                name,
                namespace,
            });
        }
    }

    fn end_tag(&mut self, name: AtomId) {
        // The synthetic root is never closed by markup.
        if self
            .doc
            .atoms()
            .get("html")
            .is_some_and(|html| html == name)
        {
            log::trace!(target: "html_spans.builder", "root end tag ignored");
            return;
        }
        let scope = match self.mode {
            InsertionMode::InTable
            | InsertionMode::InTableBody
            | InsertionMode::InRow
            | InsertionMode::InCell => ScopeKind::Table,
            _ => ScopeKind::InScope,
        };
        match self.stack.find_in_scope(name, scope) {
            Some(index) if index > 0 => {
                let matched = self.stack.pop_through(index);
                if let FormPointer::Parsed(form) = self.form
                    && matched.node == form
                {
                    self.form = FormPointer::Unset;
                }
            }
            _ => {
                log::trace!(target: "html_spans.builder", "unmatched end tag ignored");
            }
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.insertion_parent();
        if let Some(last) = self.doc.last_child(parent)
            && self.doc.kind(last) == NodeKind::Text
        {
            self.doc.append_text(last, text);
            return;
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }

    fn comment(&mut self, text: &str) {
        let parent = self.insertion_parent();
        let node = self.doc.create_comment(text);
        self.doc.append_child(parent, node);
    }

    fn end_of_input(&mut self) {
        let open = self.stack.depth().saturating_sub(1);
        if open > 0 {
            log::trace!(target: "html_spans.builder", "end of input closes {open} open element(s)");
        }
        self.stack.items.truncate(1);
    }
}
