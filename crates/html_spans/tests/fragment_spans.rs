use std::io::Cursor;

use html_spans::{
    ContextIssue, Document, FragmentContext, FragmentError, NodeHandle, NodeKind, ParsedFragment,
    Span, Tag, parse_fragment_with_spans,
};
use html_test_support::snapshot::{format_forest, span_json};
use html_test_support::stream::DribbleReader;

fn parse(input: &str) -> ParsedFragment {
    parse_fragment_with_spans(Cursor::new(input.to_string()), None).expect("fragment parses")
}

fn span(parsed: &ParsedFragment, node: NodeHandle) -> Span {
    parsed.spans.get(node).expect("node has a span entry")
}

fn slice(input: &str, span: Span) -> &str {
    &input[span.start..span.end]
}

#[test]
fn element_span_covers_open_tag_through_close_tag() {
    let input = "<b>hi</b>";
    let parsed = parse(input);
    assert_eq!(parsed.nodes.len(), 1);

    let b = parsed.nodes[0];
    assert_eq!(parsed.doc.kind(b), NodeKind::Element);
    assert_eq!(parsed.doc.tag_name(b), Some("b"));
    assert_eq!(span(&parsed, b), Span::new(0, 9));
    // The synthetic root is gone from the result's ancestry.
    assert_eq!(parsed.doc.parent(b), None);

    let text = parsed.doc.first_child(b).expect("text child");
    assert_eq!(span(&parsed, text), Span::new(3, 5));
    assert_eq!(slice(input, span(&parsed, text)), "hi");
}

#[test]
fn context_parse_yields_same_spans() {
    let input = "<b>hi</b>";
    let bare = parse(input);

    let mut context_doc = Document::new();
    let div = context_doc.create_element("div");
    let under_div = parse_fragment_with_spans(
        Cursor::new(input.to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: div,
        }),
    )
    .expect("context fragment parses");

    assert_eq!(
        span_json(&bare.doc, &bare.nodes, &bare.spans),
        span_json(&under_div.doc, &under_div.nodes, &under_div.spans)
    );
}

#[test]
fn nested_elements_resolve_independently() {
    let input = "<div>a<div>b</div>c</div>";
    let parsed = parse(input);
    assert_eq!(parsed.nodes.len(), 1);

    let outer = parsed.nodes[0];
    assert_eq!(span(&parsed, outer), Span::new(0, 25));

    let children: Vec<_> = parsed.doc.children(outer).collect();
    assert_eq!(children.len(), 3);
    assert_eq!(span(&parsed, children[0]), Span::new(5, 6));
    assert_eq!(span(&parsed, children[1]), Span::new(6, 18));
    assert_eq!(slice(input, span(&parsed, children[1])), "<div>b</div>");
    assert_eq!(span(&parsed, children[2]), Span::new(18, 19));

    let inner_text = parsed.doc.first_child(children[1]).expect("inner text");
    assert_eq!(span(&parsed, inner_text), Span::new(11, 12));
}

#[test]
fn sibling_elements_do_not_share_offsets() {
    let input = "<b>x</b><i>y</i>";
    let parsed = parse(input);
    assert_eq!(parsed.nodes.len(), 2);
    assert_eq!(span(&parsed, parsed.nodes[0]), Span::new(0, 8));
    assert_eq!(span(&parsed, parsed.nodes[1]), Span::new(8, 16));
    assert_eq!(slice(input, span(&parsed, parsed.nodes[1])), "<i>y</i>");
}

#[test]
fn leaf_nodes_have_exact_spans() {
    let input = "a<br>b<!--c-->";
    let parsed = parse(input);
    let labels: Vec<_> = parsed
        .nodes
        .iter()
        .map(|&node| parsed.doc.kind(node))
        .collect();
    assert_eq!(
        labels,
        vec![
            NodeKind::Text,
            NodeKind::Element,
            NodeKind::Text,
            NodeKind::Comment
        ]
    );
    assert_eq!(slice(input, span(&parsed, parsed.nodes[0])), "a");
    assert_eq!(slice(input, span(&parsed, parsed.nodes[1])), "<br>");
    assert_eq!(slice(input, span(&parsed, parsed.nodes[2])), "b");
    assert_eq!(slice(input, span(&parsed, parsed.nodes[3])), "<!--c-->");
}

#[test]
fn empty_fragment_yields_no_nodes_and_no_error() {
    let parsed = parse("");
    assert!(parsed.nodes.is_empty());
}

#[test]
fn non_element_context_is_rejected() {
    let mut context_doc = Document::new();
    let text = context_doc.create_text("x");
    let err = parse_fragment_with_spans(
        Cursor::new("<b>hi</b>".to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: text,
        }),
    )
    .expect_err("non-element context rejected");
    assert!(matches!(
        err,
        FragmentError::InvalidContext(ContextIssue::NotAnElement(NodeKind::Text))
    ));
}

#[test]
fn inconsistent_context_identity_is_rejected() {
    let mut context_doc = Document::new();
    let lying = context_doc.create_element_parts(Some(Tag::B), "div");
    let err = parse_fragment_with_spans(
        Cursor::new("x".to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: lying,
        }),
    )
    .expect_err("inconsistent context rejected");
    match err {
        FragmentError::InvalidContext(ContextIssue::TagMismatch { tag, name }) => {
            assert_eq!(tag, Some(Tag::B));
            assert_eq!(name, "div");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_context_tag_is_consistent_when_both_sides_are_unknown() {
    let mut context_doc = Document::new();
    let future = context_doc.create_element("tagfromthefuture");
    let parsed = parse_fragment_with_spans(
        Cursor::new("<b>x</b>".to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: future,
        }),
    )
    .expect("unknown-but-consistent context parses");
    assert_eq!(parsed.nodes.len(), 1);
}

#[test]
fn every_tree_node_is_mapped_and_contained() {
    let input = "<div id=\"x\">a<b>bold</b></div><p>tail</p>";
    let parsed = parse(input);

    fn walk(parsed: &ParsedFragment, input: &str, node: NodeHandle, parent: Option<Span>) {
        let span = parsed.spans.get(node).expect("every node has an entry");
        assert!(span.start <= span.end);
        assert!(span.end <= input.len());
        if let Some(parent) = parent {
            assert!(parent.start <= span.start && span.end <= parent.end);
        }
        if parsed.doc.kind(node) == NodeKind::Text {
            assert_eq!(
                slice(input, span),
                parsed.doc.text(node).expect("text payload")
            );
        }
        for child in parsed.doc.children(node) {
            walk(parsed, input, child, Some(span));
        }
    }

    for &node in &parsed.nodes {
        walk(&parsed, input, node, None);
    }
    assert_eq!(parsed.doc.attr(parsed.nodes[0], "id"), Some("x"));
}

#[test]
fn spans_stay_absolute_across_buffer_rebases() {
    // Long enough to force several tokenizer buffer compactions.
    let mut input = String::new();
    for i in 0..600 {
        input.push_str(&format!("<li>item {i}</li>"));
    }
    assert!(input.len() > 8192);

    let parsed = parse(&input);
    assert_eq!(parsed.nodes.len(), 600);
    for (i, &li) in parsed.nodes.iter().enumerate() {
        let expected = format!("<li>item {i}</li>");
        assert_eq!(slice(&input, span(&parsed, li)), expected, "item {i}");
        let text = parsed.doc.first_child(li).expect("item text");
        assert_eq!(slice(&input, span(&parsed, text)), format!("item {i}"));
    }
}

#[test]
fn reparsing_is_idempotent() {
    let input = "<div>a<b>bold</b><br>tail</div><!--done-->";
    let first = parse(input);
    let second = parse(input);
    assert_eq!(
        format_forest(&first.doc, &first.nodes, &first.spans),
        format_forest(&second.doc, &second.nodes, &second.spans)
    );
    let a: serde_json::Value =
        serde_json::from_str(&span_json(&first.doc, &first.nodes, &first.spans))
            .expect("span json parses");
    let b: serde_json::Value =
        serde_json::from_str(&span_json(&second.doc, &second.nodes, &second.spans))
            .expect("span json parses");
    assert_eq!(a, b);
}

#[test]
fn script_context_treats_leading_input_as_raw_text() {
    let input = "alert(1)</script><b>t</b>";
    let mut context_doc = Document::new();
    let script = context_doc.create_element("script");
    let parsed = parse_fragment_with_spans(
        Cursor::new(input.to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: script,
        }),
    )
    .expect("script context parses");

    assert_eq!(parsed.nodes.len(), 2);
    assert_eq!(parsed.doc.kind(parsed.nodes[0]), NodeKind::Text);
    assert_eq!(parsed.doc.text(parsed.nodes[0]), Some("alert(1)"));
    // The stray close tag that ended the raw text extends the text node's
    // span; the element that follows is unaffected.
    assert_eq!(span(&parsed, parsed.nodes[0]), Span::new(0, 17));
    assert_eq!(span(&parsed, parsed.nodes[1]), Span::new(17, 25));
}

#[test]
fn plaintext_context_consumes_everything() {
    let input = "a<b></plaintext>c";
    let mut context_doc = Document::new();
    let plaintext = context_doc.create_element("plaintext");
    let parsed = parse_fragment_with_spans(
        Cursor::new(input.to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: plaintext,
        }),
    )
    .expect("plaintext context parses");
    assert_eq!(parsed.nodes.len(), 1);
    assert_eq!(parsed.doc.text(parsed.nodes[0]), Some(input));
}

#[test]
fn ancestor_form_context_suppresses_form_tags() {
    let mut context_doc = Document::new();
    let form = context_doc.create_element("form");
    let div = context_doc.create_element("div");
    context_doc.append_child(form, div);

    let input = "<form><input>";
    let parsed = parse_fragment_with_spans(
        Cursor::new(input.to_string()),
        Some(FragmentContext {
            doc: &context_doc,
            node: div,
        }),
    )
    .expect("fragment under form parses");

    // The nested form start tag is ignored; only the input remains.
    assert_eq!(parsed.nodes.len(), 1);
    assert_eq!(parsed.doc.tag_name(parsed.nodes[0]), Some("input"));
    assert_eq!(span(&parsed, parsed.nodes[0]), Span::new(6, 13));
}

#[test]
fn without_form_context_the_form_element_is_kept() {
    let parsed = parse("<form><input>");
    assert_eq!(parsed.nodes.len(), 1);
    assert_eq!(parsed.doc.tag_name(parsed.nodes[0]), Some("form"));
    let input_el = parsed.doc.first_child(parsed.nodes[0]).expect("input");
    assert_eq!(parsed.doc.tag_name(input_el), Some("input"));
}

#[test]
fn cdata_is_text_only_in_foreign_content() {
    let input = "<svg><![CDATA[a<b]]></svg>";
    let parsed = parse(input);
    let svg = parsed.nodes[0];
    assert_eq!(span(&parsed, svg), Span::new(0, 26));
    let text = parsed.doc.first_child(svg).expect("cdata text");
    assert_eq!(parsed.doc.kind(text), NodeKind::Text);
    assert_eq!(parsed.doc.text(text), Some("a<b"));
    assert_eq!(slice(input, span(&parsed, text)), "<![CDATA[a<b]]>");

    // Outside foreign content the same bytes are a bogus comment.
    let parsed = parse("<![CDATA[a]]>");
    assert_eq!(parsed.doc.kind(parsed.nodes[0]), NodeKind::Comment);
}

#[test]
fn dribbled_reads_match_one_shot_reads() {
    let input = "<p>caf\u{e9} \u{1F600}</p><ul><li>one<li>two</ul>";
    let one_shot = parse(input);
    let dribbled = parse_fragment_with_spans(DribbleReader::new(input.as_bytes(), 1), None)
        .expect("dribbled parse succeeds");
    assert_eq!(
        format_forest(&one_shot.doc, &one_shot.nodes, &one_shot.spans),
        format_forest(&dribbled.doc, &dribbled.nodes, &dribbled.spans)
    );
    assert_eq!(
        span_json(&one_shot.doc, &one_shot.nodes, &one_shot.spans),
        span_json(&dribbled.doc, &dribbled.nodes, &dribbled.spans)
    );
}

#[test]
fn stray_end_tag_extends_the_preceding_node() {
    // Known imprecision of the newest-node heuristic: a dropped end tag is
    // attributed to the node before it.
    let input = "x</i>y";
    let parsed = parse(input);
    assert_eq!(parsed.nodes.len(), 1);
    assert_eq!(parsed.doc.text(parsed.nodes[0]), Some("xy"));
    assert_eq!(span(&parsed, parsed.nodes[0]), Span::new(0, 6));
}

#[test]
fn read_failure_surfaces_as_lex_error() {
    use std::io::Read;

    struct FailAfterPrefix {
        data: &'static [u8],
        pos: usize,
    }

    impl Read for FailAfterPrefix {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos == self.data.len() {
                return Err(std::io::Error::other("connection reset"));
            }
            let n = (self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    let err = parse_fragment_with_spans(
        FailAfterPrefix {
            data: b"<div>partial",
            pos: 0,
        },
        None,
    )
    .expect_err("stream failure propagates");
    assert!(matches!(err, FragmentError::Lex(_)));
}
