//! Field values
//!
//! A [`Value`] is the ordered list of pieces a BibTeX field is made of. In the
//! source text the pieces are joined with `#`; persons and keywords may also
//! share one delimited string.

use serde::{Deserialize, Serialize};

/// A structured person name.
///
/// The "von" particle (if any) is kept as the leading part of `last_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub first_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
}

impl Person {
    /// Create a person with just a last name
    pub fn new(last_name: impl Into<String>) -> Self {
        Self {
            first_name: None,
            last_name: last_name.into(),
            suffix: None,
        }
    }

    /// Builder method to add the first name(s)
    pub fn with_first_name(mut self, first: impl Into<String>) -> Self {
        let first = first.into();
        self.first_name = (!first.is_empty()).then_some(first);
        self
    }

    /// Builder method to add a suffix such as "Jr."
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// Format as "First Last, Suffix" for display
    pub fn display_name(&self) -> String {
        let mut name = match &self.first_name {
            Some(first) => format!("{} {}", first, self.last_name),
            None => self.last_name.clone(),
        };
        if let Some(suffix) = &self.suffix {
            name.push_str(", ");
            name.push_str(suffix);
        }
        name
    }
}

/// One atomic piece of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueItem {
    /// Ordinary text; nested brace groups are kept verbatim
    PlainText(String),
    /// Text exempt from case changes and escaping (URLs, DOIs, crossrefs)
    VerbatimText(String),
    Person(Person),
    Keyword(String),
    /// Reference to a `@string` macro or a built-in month abbreviation
    MacroKey(String),
}

impl ValueItem {
    /// Text of this item alone, as shown to a reader.
    pub fn text(&self) -> String {
        match self {
            ValueItem::PlainText(text)
            | ValueItem::VerbatimText(text)
            | ValueItem::Keyword(text)
            | ValueItem::MacroKey(text) => text.clone(),
            ValueItem::Person(person) => person.display_name(),
        }
    }

    pub fn is_person(&self) -> bool {
        matches!(self, ValueItem::Person(_))
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self, ValueItem::Keyword(_))
    }

    pub fn is_macro_key(&self) -> bool {
        matches!(self, ValueItem::MacroKey(_))
    }
}

/// Ordered sequence of [`ValueItem`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value {
    items: Vec<ValueItem>,
}

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<ValueItem>) -> Self {
        Self { items }
    }

    /// A value consisting of a single plain text item
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_items(vec![ValueItem::PlainText(text.into())])
    }

    /// A value consisting of a single verbatim text item
    pub fn verbatim(text: impl Into<String>) -> Self {
        Self::from_items(vec![ValueItem::VerbatimText(text.into())])
    }

    /// A value consisting of a single macro reference
    pub fn macro_key(key: impl Into<String>) -> Self {
        Self::from_items(vec![ValueItem::MacroKey(key.into())])
    }

    pub fn push(&mut self, item: ValueItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ValueItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Persons contained in this value, in order
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.items.iter().filter_map(|item| match item {
            ValueItem::Person(person) => Some(person),
            _ => None,
        })
    }

    /// Render the value as plain text.
    ///
    /// Neighbouring persons are joined with " and ", neighbouring keywords
    /// with "; ". Text pieces and macro keys are concatenated the way `#`
    /// concatenates them; any other transition gets a single space.
    pub fn text(&self) -> String {
        let mut result = String::new();
        let mut previous: Option<&ValueItem> = None;

        for item in &self.items {
            let next = item.text();
            if next.is_empty() {
                continue;
            }
            if let Some(prev) = previous {
                match (prev, item) {
                    (ValueItem::Person(_), ValueItem::Person(_)) => result.push_str(" and "),
                    (ValueItem::Keyword(_), ValueItem::Keyword(_)) => result.push_str("; "),
                    (ValueItem::Person(_) | ValueItem::Keyword(_), _)
                    | (_, ValueItem::Person(_) | ValueItem::Keyword(_)) => result.push(' '),
                    _ => {}
                }
            }
            result.push_str(&next);
            previous = Some(item);
        }

        result
    }
}

impl From<Vec<ValueItem>> for Value {
    fn from(items: Vec<ValueItem>) -> Self {
        Self::from_items(items)
    }
}

impl FromIterator<ValueItem> for Value {
    fn from_iter<I: IntoIterator<Item = ValueItem>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl IntoIterator for Value {
    type Item = ValueItem;
    type IntoIter = std::vec::IntoIter<ValueItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Value {
    type Item = &'a ValueItem;
    type IntoIter = std::slice::Iter<'a, ValueItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
