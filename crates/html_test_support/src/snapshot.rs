//! Render a parsed forest plus its span map as comparable text lines, and as
//! canonical JSON for map-equality assertions.

use html_spans::{Document, NodeHandle, NodeKind, SpanMap};

use crate::escape_text;

/// One line per node, depth-indented, with the node's span:
///
/// ```text
/// <div> (0,30)
///   "a" (12,13)
/// ```
pub fn format_forest(doc: &Document, nodes: &[NodeHandle], spans: &SpanMap) -> Vec<String> {
    let mut out = Vec::new();
    for &node in nodes {
        format_node(doc, node, spans, 0, &mut out);
    }
    out
}

fn format_node(
    doc: &Document,
    node: NodeHandle,
    spans: &SpanMap,
    depth: usize,
    out: &mut Vec<String>,
) {
    let span = match spans.get(node) {
        Some(span) => format!("({},{})", span.start, span.end),
        None => "(unmapped)".to_string(),
    };
    let label = match doc.kind(node) {
        NodeKind::Element => format!("<{}>", doc.tag_name(node).unwrap_or("?")),
        NodeKind::Text => format!("\"{}\"", escape_text(doc.text(node).unwrap_or(""))),
        NodeKind::Comment => format!("<!--{}-->", escape_text(doc.text(node).unwrap_or(""))),
        NodeKind::Document => "#document".to_string(),
    };
    out.push(format!("{}{label} {span}", "  ".repeat(depth)));
    for child in doc.children(node) {
        format_node(doc, child, spans, depth + 1, out);
    }
}

/// Canonical JSON of the forest's spans in document order. Two parses of the
/// same input must serialize identically (position, not node identity).
pub fn span_json(doc: &Document, nodes: &[NodeHandle], spans: &SpanMap) -> String {
    let mut entries = Vec::new();
    for &node in nodes {
        collect_json(doc, node, spans, &mut entries);
    }
    serde_json::Value::Array(entries).to_string()
}

fn collect_json(
    doc: &Document,
    node: NodeHandle,
    spans: &SpanMap,
    out: &mut Vec<serde_json::Value>,
) {
    let (start, end) = spans
        .get(node)
        .map(|span| (span.start, span.end))
        .unwrap_or((usize::MAX, usize::MAX));
    let label = match doc.kind(node) {
        NodeKind::Element => doc.tag_name(node).unwrap_or("?").to_string(),
        NodeKind::Text => "#text".to_string(),
        NodeKind::Comment => "#comment".to_string(),
        NodeKind::Document => "#document".to_string(),
    };
    out.push(serde_json::json!([label, start, end]));
    for child in doc.children(node) {
        collect_json(doc, child, spans, out);
    }
}
