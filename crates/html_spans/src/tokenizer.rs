//! Pull tokenizer with buffer-relative raw byte ranges.
//!
//! `next()` advances one token; the current token, its raw byte range, and
//! the stream error are read through accessors. Raw ranges index the internal
//! decoded buffer and are only valid until the next `next()` call: once the
//! consumed prefix passes `COMPACT_MIN` the buffer is compacted and all
//! offsets rebase toward zero. Compaction happens only at token boundaries,
//! so the discarded length always equals the previous token's raw end.
//!
//! Tag and attribute names are restricted to ASCII `[A-Za-z0-9:_-]`; slice
//! endpoints therefore always land next to ASCII structural bytes and stay on
//! UTF-8 boundaries.

use std::io::Read;

use memchr::memchr;

use crate::atom::AtomTable;
use crate::entities::decode_entities;
use crate::input::{BufferedInput, COMPACT_MIN};
use crate::span::Span;
use crate::tag::{self, RawKind, Tag};
use crate::token::{Attribute, Token};

/// Terminal condition of the token stream.
#[derive(Debug)]
pub enum StreamError {
    /// The source is cleanly exhausted. Not an error for callers of the
    /// public parse API; it just ends the loop.
    EndOfInput,
    /// The underlying reader failed.
    Io(std::io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::EndOfInput => write!(f, "end of input"),
            StreamError::Io(err) => write!(f, "read failed: {err}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::EndOfInput => None,
            StreamError::Io(err) => Some(err),
        }
    }
}

#[derive(Debug)]
struct RawContext {
    name: String,
    kind: RawKind,
}

pub struct Tokenizer<R> {
    input: BufferedInput<R>,
    raw_start: usize,
    raw_end: usize,
    token: Token,
    err: Option<StreamError>,
    cdata_allowed: bool,
    raw_context: Option<RawContext>,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(src: R) -> Self {
        Self::fragment(src, None)
    }

    /// Tokenizer seeded with a fragment context tag.
    ///
    /// A rawtext/RCDATA/plaintext context (`script`, `title`, ...) makes the
    /// leading input content data for that element, up to its close tag.
    pub fn fragment(src: R, context_tag: Option<&str>) -> Self {
        let raw_context = context_tag.and_then(|name| {
            let folded = name.to_ascii_lowercase();
            let kind = Tag::lookup(&folded).and_then(tag::raw_kind)?;
            Some(RawContext { name: folded, kind })
        });
        Self {
            input: BufferedInput::new(src),
            raw_start: 0,
            raw_end: 0,
            token: Token::Error,
            err: None,
            cdata_allowed: false,
            raw_context,
        }
    }

    /// Whether `<![CDATA[ ... ]]>` sections are currently legal (foreign
    /// content only); outside them the construct is a bogus comment.
    pub fn set_cdata_allowed(&mut self, allowed: bool) {
        self.cdata_allowed = allowed;
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Raw byte range of the current token, in buffer-relative coordinates.
    pub fn raw_span(&self) -> Span {
        Span::new(self.raw_start, self.raw_end)
    }

    pub fn raw_end(&self) -> usize {
        self.raw_end
    }

    pub fn err(&self) -> Option<&StreamError> {
        self.err.as_ref()
    }

    pub(crate) fn take_err(&mut self) -> Option<StreamError> {
        self.err.take()
    }

    /// Advance one token. After the stream ends (or fails) this keeps
    /// returning `Token::Error`.
    pub fn next(&mut self, atoms: &mut AtomTable) -> &Token {
        if self.err.is_some() {
            self.token = Token::Error;
            return &self.token;
        }
        if self.raw_end >= COMPACT_MIN {
            let n = self.raw_end;
            self.input.compact(n);
            self.raw_end = 0;
            log::trace!(
                target: "html_spans.tokenizer",
                "compacted {n} consumed bytes; raw offsets rebased"
            );
        }
        self.raw_start = self.raw_end;
        if let Some(ctx) = self.raw_context.take()
            && self.scan_raw_content(&ctx)
        {
            return &self.token;
        }
        self.scan_markup(atoms);
        &self.token
    }

    /// Content of a rawtext/RCDATA/plaintext element as one text token.
    /// Returns false when the content is empty (the close tag, or EOF, is
    /// handled by the regular scan).
    fn scan_raw_content(&mut self, ctx: &RawContext) -> bool {
        let pos = self.raw_start;
        if !self.input.ensure(pos) {
            return false;
        }
        let end = if ctx.kind == RawKind::Plaintext {
            self.read_to_end()
        } else {
            let mut i = pos;
            loop {
                if !self.input.ensure(i) {
                    break self.input.len();
                }
                let avail = self.input.len();
                let found =
                    memchr(b'<', &self.input.as_str().as_bytes()[i..avail]).map(|rel| i + rel);
                match found {
                    Some(candidate) => {
                        if self.close_tag_at(candidate, &ctx.name) {
                            break candidate;
                        }
                        i = candidate + 1;
                    }
                    None => i = avail,
                }
            }
        };
        if end == pos {
            return false;
        }
        let text = match ctx.kind {
            RawKind::Rcdata => decode_entities(self.slice(pos, end)),
            RawKind::Rawtext | RawKind::Plaintext => self.slice(pos, end).to_string(),
        };
        self.raw_end = end;
        self.token = Token::Text { text };
        true
    }

    /// `</name`, optional ASCII whitespace, `>` — case-insensitive on the
    /// name, matching how rawtext close tags are recognized lexically.
    fn close_tag_at(&mut self, at: usize, name: &str) -> bool {
        if !self.input.ensure(at + 1) || self.input.byte(at + 1) != b'/' {
            return false;
        }
        for (j, expected) in name.bytes().enumerate() {
            let k = at + 2 + j;
            if !self.input.ensure(k) || !self.input.byte(k).eq_ignore_ascii_case(&expected) {
                return false;
            }
        }
        let mut k = at + 2 + name.len();
        loop {
            if !self.input.ensure(k) {
                return false;
            }
            let b = self.input.byte(k);
            if b.is_ascii_whitespace() {
                k += 1;
                continue;
            }
            return b == b'>';
        }
    }

    fn scan_markup(&mut self, atoms: &mut AtomTable) {
        let pos = self.raw_start;
        if !self.input.ensure(pos) {
            return self.finish_stream();
        }
        if self.input.byte(pos) != b'<' {
            return self.scan_text(pos);
        }
        if !self.input.ensure(pos + 1) {
            // Lone `<` at the very end is literal text.
            return self.scan_text(pos);
        }
        let b = self.input.byte(pos + 1);
        if b == b'/' {
            return self.scan_end_tag(pos, atoms);
        }
        if b.is_ascii_alphabetic() {
            return self.scan_start_tag(pos, atoms);
        }
        if b == b'!' {
            return self.scan_markup_declaration(pos);
        }
        if b == b'?' {
            return self.scan_bogus_comment(pos + 2);
        }
        self.scan_text(pos)
    }

    fn scan_text(&mut self, pos: usize) {
        let from = if self.input.byte(pos) == b'<' {
            pos + 1
        } else {
            pos
        };
        let end = self.find_byte(b'<', from).unwrap_or_else(|| self.input.len());
        let text = decode_entities(self.slice(pos, end));
        self.raw_end = end;
        self.token = Token::Text { text };
    }

    fn scan_end_tag(&mut self, pos: usize, atoms: &mut AtomTable) {
        let name_start = pos + 2;
        let Some(name_end) = self.scan_name_run(name_start) else {
            return self.finish_stream();
        };
        if name_end == name_start {
            return self.scan_bogus_comment(name_start);
        }
        let name = atoms.intern_ascii_lowercase(self.slice(name_start, name_end));
        let Some(gt) = self.find_byte(b'>', name_end) else {
            return self.finish_stream();
        };
        self.raw_end = gt + 1;
        self.token = Token::EndTag { name };
    }

    fn scan_start_tag(&mut self, pos: usize, atoms: &mut AtomTable) {
        let name_start = pos + 1;
        let Some(name_end) = self.scan_name_run(name_start) else {
            return self.finish_stream();
        };
        let name = atoms.intern_ascii_lowercase(self.slice(name_start, name_end));
        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;
        let mut i = name_end;
        loop {
            let Some(at) = self.skip_whitespace(i) else {
                return self.finish_stream();
            };
            i = at;
            match self.input.byte(i) {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    if self.input.ensure(i + 1) && self.input.byte(i + 1) == b'>' {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                _ => {
                    let attr_start = i;
                    let Some(attr_end) = self.scan_name_run(attr_start) else {
                        return self.finish_stream();
                    };
                    if attr_end == attr_start {
                        i = attr_start + 1;
                        continue;
                    }
                    let attr_name =
                        atoms.intern_ascii_lowercase(self.slice(attr_start, attr_end));
                    let Some(eq) = self.skip_whitespace(attr_end) else {
                        return self.finish_stream();
                    };
                    i = eq;
                    let value = if self.input.byte(i) == b'=' {
                        let Some(vstart) = self.skip_whitespace(i + 1) else {
                            return self.finish_stream();
                        };
                        match self.scan_attr_value(vstart) {
                            Some((value, after)) => {
                                i = after;
                                Some(value)
                            }
                            None => return self.finish_stream(),
                        }
                    } else {
                        None
                    };
                    if !attrs.iter().any(|attr| attr.name == attr_name) {
                        attrs.push(Attribute {
                            name: attr_name,
                            value,
                        });
                    }
                }
            }
        }
        self.raw_end = i;
        if !self_closing
            && let Some(kind) = Tag::lookup(atoms.resolve(name)).and_then(tag::raw_kind)
        {
            self.raw_context = Some(RawContext {
                name: atoms.resolve(name).to_string(),
                kind,
            });
        }
        self.token = Token::StartTag {
            name,
            attrs,
            self_closing,
        };
    }

    fn scan_attr_value(&mut self, vstart: usize) -> Option<(String, usize)> {
        let quote = self.input.byte(vstart);
        if quote == b'"' || quote == b'\'' {
            let inner = vstart + 1;
            let close = self.find_byte(quote, inner)?;
            return Some((decode_entities(self.slice(inner, close)), close + 1));
        }
        let mut i = vstart;
        loop {
            if !self.input.ensure(i) {
                return None;
            }
            let b = self.input.byte(i);
            if b.is_ascii_whitespace() || b == b'>' {
                break;
            }
            if b == b'/' && self.input.ensure(i + 1) && self.input.byte(i + 1) == b'>' {
                break;
            }
            i += 1;
        }
        Some((self.slice(vstart, i).to_string(), i))
    }

    fn scan_markup_declaration(&mut self, pos: usize) {
        if self.has_prefix(pos + 2, b"--") {
            return self.scan_comment(pos);
        }
        if self.has_ci_prefix(pos + 2, b"doctype") {
            return self.scan_doctype(pos);
        }
        if self.cdata_allowed && self.has_prefix(pos + 2, b"[CDATA[") {
            return self.scan_cdata(pos);
        }
        self.scan_bogus_comment(pos + 2)
    }

    fn scan_comment(&mut self, pos: usize) {
        let body = pos + 4;
        match self.find_sequence(b"-->", body) {
            Some(end) => {
                let text = self.slice(body, end).to_string();
                self.raw_end = end + 3;
                self.token = Token::Comment { text };
            }
            None => {
                let text = self.slice(body, self.input.len()).to_string();
                self.raw_end = self.input.len();
                self.token = Token::Comment { text };
            }
        }
    }

    fn scan_doctype(&mut self, pos: usize) {
        let body = pos + 2;
        match self.find_byte(b'>', body) {
            Some(gt) => {
                let text = self.slice(body, gt).trim().to_string();
                self.raw_end = gt + 1;
                self.token = Token::Doctype { text };
            }
            None => {
                let text = self.slice(body, self.input.len()).trim().to_string();
                self.raw_end = self.input.len();
                self.token = Token::Doctype { text };
            }
        }
    }

    fn scan_cdata(&mut self, pos: usize) {
        let body = pos + 9;
        match self.find_sequence(b"]]>", body) {
            Some(end) => {
                let text = self.slice(body, end).to_string();
                self.raw_end = end + 3;
                self.token = Token::Text { text };
            }
            None => {
                let text = self.slice(body, self.input.len()).to_string();
                self.raw_end = self.input.len();
                self.token = Token::Text { text };
            }
        }
    }

    fn scan_bogus_comment(&mut self, body: usize) {
        match self.find_byte(b'>', body) {
            Some(gt) => {
                let text = self.slice(body, gt).to_string();
                self.raw_end = gt + 1;
                self.token = Token::Comment { text };
            }
            None => {
                let text = self.slice(body, self.input.len()).to_string();
                self.raw_end = self.input.len();
                self.token = Token::Comment { text };
            }
        }
    }

    /// End of the `[A-Za-z0-9:_-]` run starting at `from`; `None` only when
    /// the stream ends (or fails) inside an open construct.
    fn scan_name_run(&mut self, from: usize) -> Option<usize> {
        let mut i = from;
        loop {
            if !self.input.ensure(i) {
                return None;
            }
            if is_name_byte(self.input.byte(i)) {
                i += 1;
            } else {
                return Some(i);
            }
        }
    }

    fn skip_whitespace(&mut self, from: usize) -> Option<usize> {
        let mut i = from;
        loop {
            if !self.input.ensure(i) {
                return None;
            }
            if self.input.byte(i).is_ascii_whitespace() {
                i += 1;
            } else {
                return Some(i);
            }
        }
    }

    fn find_byte(&mut self, needle: u8, from: usize) -> Option<usize> {
        let mut i = from;
        loop {
            if !self.input.ensure(i) {
                return None;
            }
            let avail = self.input.len();
            let found = memchr(needle, &self.input.as_str().as_bytes()[i..avail]);
            match found {
                Some(rel) => return Some(i + rel),
                None => i = avail,
            }
        }
    }

    fn find_sequence(&mut self, needle: &[u8], from: usize) -> Option<usize> {
        debug_assert!(!needle.is_empty());
        let mut i = from;
        loop {
            let candidate = self.find_byte(needle[0], i)?;
            let mut matched = true;
            for (j, &expected) in needle.iter().enumerate().skip(1) {
                if !self.input.ensure(candidate + j) {
                    return None;
                }
                if self.input.byte(candidate + j) != expected {
                    matched = false;
                    break;
                }
            }
            if matched {
                return Some(candidate);
            }
            i = candidate + 1;
        }
    }

    fn has_prefix(&mut self, at: usize, pat: &[u8]) -> bool {
        for (j, &expected) in pat.iter().enumerate() {
            if !self.input.ensure(at + j) || self.input.byte(at + j) != expected {
                return false;
            }
        }
        true
    }

    fn has_ci_prefix(&mut self, at: usize, pat: &[u8]) -> bool {
        for (j, expected) in pat.iter().enumerate() {
            if !self.input.ensure(at + j)
                || !self.input.byte(at + j).eq_ignore_ascii_case(expected)
            {
                return false;
            }
        }
        true
    }

    fn read_to_end(&mut self) -> usize {
        loop {
            let len = self.input.len();
            if !self.input.ensure(len) {
                return self.input.len();
            }
        }
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        debug_assert!(self.input.as_str().is_char_boundary(start));
        debug_assert!(self.input.as_str().is_char_boundary(end));
        &self.input.as_str()[start..end]
    }

    fn finish_stream(&mut self) {
        self.raw_end = self.input.len();
        self.err = Some(match self.input.take_failure() {
            Some(err) => StreamError::Io(err),
            None => StreamError::EndOfInput,
        });
        self.token = Token::Error;
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

#[cfg(test)]
mod tests {
    use super::{StreamError, Tokenizer};
    use crate::atom::AtomTable;
    use crate::token::Token;
    use std::io::Cursor;

    fn snapshot(input: &str) -> Vec<String> {
        snapshot_fragment(input, None)
    }

    fn snapshot_fragment(input: &str, context: Option<&str>) -> Vec<String> {
        let mut atoms = AtomTable::new();
        let mut tok = Tokenizer::fragment(Cursor::new(input.to_string()), context);
        let mut out = Vec::new();
        loop {
            let token = tok.next(&mut atoms).clone();
            let raw = tok.raw_span();
            let line = match &token {
                Token::Doctype { text } => format!("Doctype({text})"),
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let mut line = format!("StartTag({}", atoms.resolve(*name));
                    for attr in attrs {
                        line.push(' ');
                        line.push_str(atoms.resolve(attr.name));
                        if let Some(value) = &attr.value {
                            line.push_str(&format!("=\"{value}\""));
                        }
                    }
                    if *self_closing {
                        line.push_str(" /");
                    }
                    line.push(')');
                    line
                }
                Token::EndTag { name } => format!("EndTag({})", atoms.resolve(*name)),
                Token::Text { text } => format!("Text({text})"),
                Token::Comment { text } => format!("Comment({text})"),
                Token::Error => break,
            };
            out.push(format!("{line} {}..{}", raw.start, raw.end));
        }
        out
    }

    #[test]
    fn basic_element_with_text() {
        assert_eq!(
            snapshot("<b>hi</b>"),
            vec!["StartTag(b) 0..3", "Text(hi) 3..5", "EndTag(b) 5..9"]
        );
    }

    #[test]
    fn attributes_parse_with_first_wins_duplicates() {
        assert_eq!(
            snapshot("<a href=\"x\" href='y' checked>t</a>"),
            vec![
                "StartTag(a href=\"x\" checked) 0..29",
                "Text(t) 29..30",
                "EndTag(a) 30..34",
            ]
        );
    }

    #[test]
    fn entities_decode_in_text_and_quoted_values() {
        assert_eq!(
            snapshot("<a title=\"a&amp;b\">x &lt; y</a>"),
            vec![
                "StartTag(a title=\"a&b\") 0..19",
                "Text(x < y) 19..27",
                "EndTag(a) 27..31",
            ]
        );
    }

    #[test]
    fn rawtext_close_is_case_insensitive_and_content_is_undecoded() {
        assert_eq!(
            snapshot("<script>a &amp; b < c</ScRiPt>"),
            vec![
                "StartTag(script) 0..8",
                "Text(a &amp; b < c) 8..21",
                "EndTag(script) 21..30",
            ]
        );
    }

    #[test]
    fn rcdata_decodes_entities() {
        assert_eq!(
            snapshot("<title>a &amp; b</title>"),
            vec![
                "StartTag(title) 0..7",
                "Text(a & b) 7..16",
                "EndTag(title) 16..24",
            ]
        );
    }

    #[test]
    fn fragment_context_seeds_rawtext() {
        assert_eq!(
            snapshot_fragment("alert(1)</script><b>t</b>", Some("script")),
            vec![
                "Text(alert(1)) 0..8",
                "EndTag(script) 8..17",
                "StartTag(b) 17..20",
                "Text(t) 20..21",
                "EndTag(b) 21..25",
            ]
        );
    }

    #[test]
    fn comments_and_doctype() {
        assert_eq!(
            snapshot("<!-- c --><!DOCTYPE html>x"),
            vec![
                "Comment( c ) 0..10",
                "Doctype(DOCTYPE html) 10..25",
                "Text(x) 25..26",
            ]
        );
    }

    #[test]
    fn cdata_requires_permission() {
        // Without permission the construct is a bogus comment.
        assert_eq!(snapshot("<![CDATA[x]]>"), vec!["Comment([CDATA[x]]) 0..13"]);

        let mut atoms = AtomTable::new();
        let mut tok = Tokenizer::new(Cursor::new("<![CDATA[a<b]]>".to_string()));
        tok.set_cdata_allowed(true);
        let token = tok.next(&mut atoms).clone();
        assert_eq!(
            token,
            Token::Text {
                text: "a<b".to_string()
            }
        );
        assert_eq!(tok.raw_span().end, 15);
    }

    #[test]
    fn literal_less_than_is_text() {
        assert_eq!(
            snapshot("a < b <i>x</i>"),
            vec![
                "Text(a ) 0..2",
                "Text(< b ) 2..6",
                "StartTag(i) 6..9",
                "Text(x) 9..10",
                "EndTag(i) 10..14",
            ]
        );
    }

    #[test]
    fn end_of_input_is_reported_via_err() {
        let mut atoms = AtomTable::new();
        let mut tok = Tokenizer::new(Cursor::new("x".to_string()));
        assert!(matches!(tok.next(&mut atoms), Token::Text { .. }));
        assert!(matches!(tok.next(&mut atoms), Token::Error));
        assert!(matches!(tok.err(), Some(StreamError::EndOfInput)));
        // The error token repeats.
        assert!(matches!(tok.next(&mut atoms), Token::Error));
    }

    #[test]
    fn plaintext_consumes_everything() {
        assert_eq!(
            snapshot_fragment("a<b></plaintext>c", Some("plaintext")),
            vec!["Text(a<b></plaintext>c) 0..17"]
        );
    }
}
