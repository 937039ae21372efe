//! Elements of a bibliography file

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::value::Value;

/// A `@string{key = value}` definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    pub key: String,
    pub value: Value,
}

impl Macro {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Free text, either written as `@comment{...}` or found between records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub use_command: bool,
}

impl Comment {
    pub fn new(text: impl Into<String>, use_command: bool) -> Self {
        Self {
            text: text.into(),
            use_command,
        }
    }
}

/// A `@preamble{...}` block, copied verbatim into generated LaTeX
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preamble {
    pub value: Value,
}

impl Preamble {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// Any record a bibliography file can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    Entry(Entry),
    Macro(Macro),
    Comment(Comment),
    Preamble(Preamble),
}

/// Which kinds of keyed elements a lookup considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFilter {
    Entries,
    Macros,
    Any,
}

impl KeyFilter {
    fn accepts(self, element: &Element) -> bool {
        matches!(
            (self, element),
            (KeyFilter::Any, Element::Entry(_) | Element::Macro(_))
                | (KeyFilter::Entries, Element::Entry(_))
                | (KeyFilter::Macros, Element::Macro(_))
        )
    }
}

impl Element {
    /// Entry id or macro key; comments and preambles have none
    pub fn key(&self) -> Option<&str> {
        match self {
            Element::Entry(entry) => Some(&entry.id),
            Element::Macro(macro_) => Some(&macro_.key),
            Element::Comment(_) | Element::Preamble(_) => None,
        }
    }

    /// Key if this element passes `filter`
    pub fn key_for(&self, filter: KeyFilter) -> Option<&str> {
        if filter.accepts(self) {
            self.key()
        } else {
            None
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Element::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&Macro> {
        match self {
            Element::Macro(macro_) => Some(macro_),
            _ => None,
        }
    }
}

impl From<Entry> for Element {
    fn from(entry: Entry) -> Self {
        Element::Entry(entry)
    }
}

impl From<Macro> for Element {
    fn from(macro_: Macro) -> Self {
        Element::Macro(macro_)
    }
}

impl From<Comment> for Element {
    fn from(comment: Comment) -> Self {
        Element::Comment(comment)
    }
}

impl From<Preamble> for Element {
    fn from(preamble: Preamble) -> Self {
        Element::Preamble(preamble)
    }
}
