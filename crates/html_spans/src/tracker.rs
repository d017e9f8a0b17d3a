//! Span tracker: correlates tree mutations with token byte offsets.
//!
//! The tree builder's mutations for a token are only visible after the token
//! is consumed, so spans are recorded one token late: each iteration first
//! assigns the *previously* read token's absolute span to the node most
//! likely affected by it, then reads the next token. A target seen for the
//! first time receives the span outright (the token opened it); a target
//! with an existing entry is being closed or extended, so it keeps its first
//! start offset and adopts the newest end offset.

use std::io::Read;

use crate::builder::TreeBuilder;
use crate::span::{Span, SpanMap};
use crate::token::Token;
use crate::tokenizer::{StreamError, Tokenizer};

/// Stream failure observed mid-parse, at an absolute input offset.
#[derive(Debug)]
pub struct LexError {
    offset: usize,
    source: std::io::Error,
}

impl LexError {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "input failed near byte {}: {}", self.offset, self.source)
    }
}

impl std::error::Error for LexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub(crate) struct TrackOutcome {
    pub(crate) spans: SpanMap,
    pub(crate) error: Option<LexError>,
}

/// Drive the token-read/tree-build loop to end-of-input, recording a span for
/// every node that was the builder's newest node at some point.
///
/// On a real stream error the partial map is returned alongside it; the
/// caller decides whether to keep it.
pub(crate) fn track_spans<R: Read>(
    tok: &mut Tokenizer<R>,
    builder: &mut TreeBuilder,
) -> TrackOutcome {
    let mut spans = SpanMap::new();
    // Fold state: absolute span of the most recently read token, and the
    // running correction for tokenizer buffer rebases.
    let mut pending = Span::new(0, 0);
    let mut correction: usize = 0;
    loop {
        let target = builder.span_target();
        match spans.get(target) {
            Some(first) => spans.insert(target, Span::new(first.start, pending.end)),
            None => spans.insert(target, pending),
        }
        // CDATA sections are allowed only in foreign content.
        tok.set_cdata_allowed(builder.top_is_foreign());
        let prev_raw_end = tok.raw_end();
        tok.next(builder.atoms_mut());
        if prev_raw_end > tok.raw_end() {
            // Raw offsets went backwards: the buffer was compacted at the
            // token boundary, discarding exactly `prev_raw_end` bytes.
            correction += prev_raw_end;
            log::trace!(
                target: "html_spans.spans",
                "buffer rebase observed; correction now {correction}"
            );
        }
        let raw = tok.raw_span();
        pending = Span::new(raw.start + correction, raw.end + correction);
        if matches!(tok.token(), Token::Error) {
            match tok.take_err() {
                Some(StreamError::Io(source)) => {
                    return TrackOutcome {
                        spans,
                        error: Some(LexError {
                            offset: pending.end,
                            source,
                        }),
                    };
                }
                // End-of-input still reaches the builder: it closes any
                // elements left open.
                Some(StreamError::EndOfInput) | None => {
                    builder.consume(&Token::Error);
                    break;
                }
            }
        }
        builder.consume(tok.token());
    }
    TrackOutcome { spans, error: None }
}
