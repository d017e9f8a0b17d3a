//! Well-known tag identities and tag-class policy.
//!
//! An element carries both a textual name (interned) and an optional `Tag`.
//! Unknown tags have no `Tag` and are matched by name; the pair must stay
//! consistent, which `parse_fragment_with_spans` verifies for caller-supplied
//! context nodes.

/// Well-known HTML/SVG/MathML tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    A,
    Applet,
    Area,
    B,
    Base,
    Blockquote,
    Body,
    Br,
    Button,
    Caption,
    Col,
    Colgroup,
    Dd,
    Div,
    Dl,
    Dt,
    Em,
    Embed,
    Form,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Head,
    Hr,
    Html,
    I,
    Iframe,
    Img,
    Input,
    Li,
    Link,
    Marquee,
    Math,
    Meta,
    Noembed,
    Noframes,
    Noscript,
    Object,
    Ol,
    Optgroup,
    Option,
    P,
    Param,
    Plaintext,
    Pre,
    Script,
    Select,
    Source,
    Span,
    Strong,
    Style,
    Svg,
    Table,
    Tbody,
    Td,
    Template,
    Textarea,
    Tfoot,
    Th,
    Thead,
    Title,
    Tr,
    Track,
    U,
    Ul,
    Wbr,
    Xmp,
}

impl Tag {
    /// Look up a lowercase tag name. Unknown names map to `None`.
    pub fn lookup(name: &str) -> Option<Tag> {
        use Tag::*;
        Some(match name {
            "a" => A,
            "applet" => Applet,
            "area" => Area,
            "b" => B,
            "base" => Base,
            "blockquote" => Blockquote,
            "body" => Body,
            "br" => Br,
            "button" => Button,
            "caption" => Caption,
            "col" => Col,
            "colgroup" => Colgroup,
            "dd" => Dd,
            "div" => Div,
            "dl" => Dl,
            "dt" => Dt,
            "em" => Em,
            "embed" => Embed,
            "form" => Form,
            "h1" => H1,
            "h2" => H2,
            "h3" => H3,
            "h4" => H4,
            "h5" => H5,
            "h6" => H6,
            "head" => Head,
            "hr" => Hr,
            "html" => Html,
            "i" => I,
            "iframe" => Iframe,
            "img" => Img,
            "input" => Input,
            "li" => Li,
            "link" => Link,
            "marquee" => Marquee,
            "math" => Math,
            "meta" => Meta,
            "noembed" => Noembed,
            "noframes" => Noframes,
            "noscript" => Noscript,
            "object" => Object,
            "ol" => Ol,
            "optgroup" => Optgroup,
            "option" => Option,
            "p" => P,
            "param" => Param,
            "plaintext" => Plaintext,
            "pre" => Pre,
            "script" => Script,
            "select" => Select,
            "source" => Source,
            "span" => Span,
            "strong" => Strong,
            "style" => Style,
            "svg" => Svg,
            "table" => Table,
            "tbody" => Tbody,
            "td" => Td,
            "template" => Template,
            "textarea" => Textarea,
            "tfoot" => Tfoot,
            "th" => Th,
            "thead" => Thead,
            "title" => Title,
            "tr" => Tr,
            "track" => Track,
            "u" => U,
            "ul" => Ul,
            "wbr" => Wbr,
            "xmp" => Xmp,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use Tag::*;
        match self {
            A => "a",
            Applet => "applet",
            Area => "area",
            B => "b",
            Base => "base",
            Blockquote => "blockquote",
            Body => "body",
            Br => "br",
            Button => "button",
            Caption => "caption",
            Col => "col",
            Colgroup => "colgroup",
            Dd => "dd",
            Div => "div",
            Dl => "dl",
            Dt => "dt",
            Em => "em",
            Embed => "embed",
            Form => "form",
            H1 => "h1",
            H2 => "h2",
            H3 => "h3",
            H4 => "h4",
            H5 => "h5",
            H6 => "h6",
            Head => "head",
            Hr => "hr",
            Html => "html",
            I => "i",
            Iframe => "iframe",
            Img => "img",
            Input => "input",
            Li => "li",
            Link => "link",
            Marquee => "marquee",
            Math => "math",
            Meta => "meta",
            Noembed => "noembed",
            Noframes => "noframes",
            Noscript => "noscript",
            Object => "object",
            Ol => "ol",
            Optgroup => "optgroup",
            Option => "option",
            P => "p",
            Param => "param",
            Plaintext => "plaintext",
            Pre => "pre",
            Script => "script",
            Select => "select",
            Source => "source",
            Span => "span",
            Strong => "strong",
            Style => "style",
            Svg => "svg",
            Table => "table",
            Tbody => "tbody",
            Td => "td",
            Template => "template",
            Textarea => "textarea",
            Tfoot => "tfoot",
            Th => "th",
            Thead => "thead",
            Title => "title",
            Tr => "tr",
            Track => "track",
            U => "u",
            Ul => "ul",
            Wbr => "wbr",
            Xmp => "xmp",
        }
    }
}

/// Void elements never take children and are not pushed on the open stack.
pub(crate) fn is_void(tag: Tag) -> bool {
    use Tag::*;
    matches!(
        tag,
        Area | Base | Br | Col | Embed | Hr | Img | Input | Link | Meta | Param | Source | Track
            | Wbr
    )
}

/// Lexical content class of elements whose body is not tokenized as markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RawKind {
    /// Content is raw text up to the matching close tag.
    Rawtext,
    /// Like rawtext, but character references are decoded.
    Rcdata,
    /// Everything to end-of-input is text.
    Plaintext,
}

/// Rawtext classification; `noscript` is rawtext because scripting is
/// treated as enabled, matching the source parser.
pub(crate) fn raw_kind(tag: Tag) -> Option<RawKind> {
    use Tag::*;
    match tag {
        Iframe | Noembed | Noframes | Noscript | Script | Style | Xmp => Some(RawKind::Rawtext),
        Textarea | Title => Some(RawKind::Rcdata),
        Plaintext => Some(RawKind::Plaintext),
        _ => None,
    }
}

/// Start tags that imply an end tag for an open `p` element.
pub(crate) fn closes_p(tag: Tag) -> bool {
    use Tag::*;
    matches!(
        tag,
        Blockquote
            | Dd
            | Div
            | Dl
            | Dt
            | Form
            | H1
            | H2
            | H3
            | H4
            | H5
            | H6
            | Hr
            | Li
            | Ol
            | P
            | Pre
            | Table
            | Ul
    )
}
