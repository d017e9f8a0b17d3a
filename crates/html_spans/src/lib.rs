//! Fragment-oriented HTML parsing with source byte spans.
//!
//! `parse_fragment_with_spans` tokenizes and tree-builds a fragment while
//! recording, for every produced node, the byte range of the original input
//! that produced it: a start tag's first byte through the byte after the
//! matching end tag for elements, the exact source run for text, comments,
//! and void elements. The tokenizer's internal buffer is compacted on long
//! inputs; the span tracker compensates, so spans are always absolute.

mod atom;
mod builder;
mod entities;
mod fragment;
mod input;
mod node;
mod span;
mod tag;
mod token;
mod tokenizer;
mod tracker;

pub use crate::atom::{AtomId, AtomTable};
pub use crate::fragment::{
    ContextIssue, FragmentContext, FragmentError, ParsedFragment, parse_fragment_with_spans,
};
pub use crate::node::{Children, Document, Namespace, NodeHandle, NodeKind};
pub use crate::span::{Span, SpanMap};
pub use crate::tag::Tag;
pub use crate::token::{Attribute, Token};
pub use crate::tokenizer::{StreamError, Tokenizer};
pub use crate::tracker::LexError;
