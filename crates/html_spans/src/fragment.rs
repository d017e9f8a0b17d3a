//! Fragment parsing entry point.
//!
//! Validates the optional context element, seeds the tokenizer's lexical
//! state and the builder's form pointer from it, runs the span tracker, and
//! unwraps the synthetic root into a flat forest plus the span map.

use std::io::Read;

use crate::builder::TreeBuilder;
use crate::node::{Document, NodeHandle, NodeKind};
use crate::span::SpanMap;
use crate::tag::Tag;
use crate::tokenizer::Tokenizer;
use crate::tracker::{self, LexError};

/// Element the fragment is parsed against, as if it were that element's
/// inner HTML. The node lives in the caller's document.
#[derive(Clone, Copy, Debug)]
pub struct FragmentContext<'a> {
    pub doc: &'a Document,
    pub node: NodeHandle,
}

/// Parsed forest. `doc` owns the nodes; `nodes` are the detached top-level
/// handles in source order; `spans` maps every tree node to its source byte
/// range (placeholder entries for synthetic nodes included).
#[derive(Debug)]
pub struct ParsedFragment {
    pub doc: Document,
    pub nodes: Vec<NodeHandle>,
    pub spans: SpanMap,
}

/// Why a context node was rejected before parsing.
#[derive(Debug, PartialEq, Eq)]
pub enum ContextIssue {
    NotAnElement(NodeKind),
    /// Stored tag identity disagrees with the textual tag name. Two unknowns
    /// are consistent; only disagreement is an error.
    TagMismatch { tag: Option<Tag>, name: String },
}

#[derive(Debug)]
pub enum FragmentError {
    InvalidContext(ContextIssue),
    Lex(LexError),
}

impl std::fmt::Display for FragmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentError::InvalidContext(ContextIssue::NotAnElement(kind)) => {
                write!(f, "fragment context must be an element, got {kind:?}")
            }
            FragmentError::InvalidContext(ContextIssue::TagMismatch { tag, name }) => {
                write!(f, "inconsistent context node: tag {tag:?}, name {name:?}")
            }
            FragmentError::Lex(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FragmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FragmentError::InvalidContext(_) => None,
            FragmentError::Lex(err) => Some(err),
        }
    }
}

/// Parse `r` as a fragment, annotating every produced node with the byte
/// span of the input that produced it.
pub fn parse_fragment_with_spans<R: Read>(
    r: R,
    context: Option<FragmentContext<'_>>,
) -> Result<ParsedFragment, FragmentError> {
    let mut context_tag: Option<Tag> = None;
    let mut context_name: Option<String> = None;
    let mut ambient_form = false;
    if let Some(ctx) = &context {
        let kind = ctx.doc.kind(ctx.node);
        if kind != NodeKind::Element {
            return Err(FragmentError::InvalidContext(ContextIssue::NotAnElement(
                kind,
            )));
        }
        let name = ctx.doc.tag_name(ctx.node).unwrap_or_default().to_string();
        let tag = ctx.doc.tag(ctx.node);
        if tag != Tag::lookup(&name) {
            return Err(FragmentError::InvalidContext(ContextIssue::TagMismatch {
                tag,
                name,
            }));
        }
        // Nearest enclosing form element becomes the ambient form context.
        let mut cursor = Some(ctx.node);
        while let Some(node) = cursor {
            if ctx.doc.kind(node) == NodeKind::Element && ctx.doc.tag(node) == Some(Tag::Form) {
                ambient_form = true;
                break;
            }
            cursor = ctx.doc.parent(node);
        }
        context_tag = tag;
        context_name = Some(name);
    }

    let mut tok = Tokenizer::fragment(r, context_name.as_deref());
    let mut builder = TreeBuilder::fragment();
    builder.reset_insertion_mode(context_tag);
    if ambient_form {
        builder.set_ambient_form();
    }

    let outcome = tracker::track_spans(&mut tok, &mut builder);
    if let Some(error) = outcome.error {
        return Err(FragmentError::Lex(error));
    }

    let root = builder.root();
    let mut doc = builder.into_document();
    let mut nodes = Vec::new();
    let mut child = doc.first_child(root);
    while let Some(node) = child {
        let next = doc.next_sibling(node);
        doc.detach(node);
        nodes.push(node);
        child = next;
    }
    Ok(ParsedFragment {
        doc,
        nodes,
        spans: outcome.spans,
    })
}
