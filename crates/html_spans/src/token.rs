//! Token model for the pull tokenizer.

use crate::atom::AtomId;

/// Attribute with interned name and entity-decoded value.
///
/// Attributes are stored in encounter order; duplicates within one start tag
/// are dropped after the first occurrence (tokenizer "first-wins" behavior).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: AtomId,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype {
        text: String,
    },
    StartTag {
        name: AtomId,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: AtomId,
    },
    /// Decoded character data (regular text, RCDATA, rawtext, or CDATA).
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
    /// Sentinel for either a real stream error or end-of-input; disambiguate
    /// through `Tokenizer::err`.
    Error,
}
