//! The file container: an ordered list of elements plus properties

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::element::{Element, KeyFilter};
use crate::entry::Entry;
use crate::properties::FileProperties;
use crate::value::{Value, ValueItem};

/// Built-in month macros and their expansions
pub const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Expansion of a built-in month macro (`jan` … `dec`, any casing)
pub fn month_name(key: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(key))
        .map(|(_, name)| *name)
}

/// Upper bound for nested macro expansion
const MAX_MACRO_DEPTH: usize = 16;

/// A bibliography: elements in file order plus file properties.
///
/// The file owns its elements. Duplicate ids are allowed; lookups return
/// the last matching element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub elements: Vec<Element>,
    #[serde(default)]
    pub properties: FileProperties,
}

impl File {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self {
            elements,
            properties: FileProperties::default(),
        }
    }

    pub fn push(&mut self, element: impl Into<Element>) {
        self.elements.push(element.into());
    }

    /// Insert at `index`, clamped to the end of the file
    pub fn insert(&mut self, index: usize, element: impl Into<Element>) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element.into());
    }

    pub fn remove(&mut self, index: usize) -> Option<Element> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    /// Append all elements of `other`, keeping this file's properties
    pub fn append(&mut self, other: File) {
        self.elements.extend(other.elements);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.elements.iter().filter_map(Element::as_entry)
    }

    /// Find the element owning `key`.
    ///
    /// Exact matches win over case-insensitive ones; among equal matches
    /// the element inserted last shadows earlier ones.
    pub fn contains_key(&self, key: &str, filter: KeyFilter) -> Option<&Element> {
        let exact = self
            .elements
            .iter()
            .rev()
            .find(|element| element.key_for(filter) == Some(key));
        exact.or_else(|| {
            self.elements.iter().rev().find(|element| {
                element
                    .key_for(filter)
                    .is_some_and(|k| k.eq_ignore_ascii_case(key))
            })
        })
    }

    /// Entry with the given id
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.contains_key(id, KeyFilter::Entries)
            .and_then(Element::as_entry)
    }

    /// Value of the macro with the given key
    pub fn macro_value(&self, key: &str) -> Option<&Value> {
        self.contains_key(key, KeyFilter::Macros)
            .and_then(Element::as_macro)
            .map(|macro_| &macro_.value)
    }

    /// Keys of all elements passing `filter`, in file order
    pub fn all_keys(&self, filter: KeyFilter) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|element| element.key_for(filter))
            .collect()
    }

    /// Keys used by more than one entry or macro, in first-seen order
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let keys = self.all_keys(KeyFilter::Any);
        for key in &keys {
            *counts.entry(*key).or_default() += 1;
        }

        let mut seen = HashSet::new();
        keys.into_iter()
            .filter(|key| counts[key] > 1 && seen.insert(*key))
            .collect()
    }

    /// Distinct texts of `field` over all entries, in first-seen order
    pub fn unique_entry_values(&self, field: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries()
            .filter_map(|entry| entry.text(field))
            .filter(|text| !text.is_empty() && seen.insert(text.clone()))
            .collect()
    }

    /// Replace macro references by their definitions.
    ///
    /// Macros defined in this file are expanded recursively; built-in month
    /// keys become month names; unknown keys are left as macro references.
    pub fn expand_macros(&self, value: &Value) -> Value {
        let mut result = Value::new();
        self.expand_into(value, &mut result, 0);
        result
    }

    fn expand_into(&self, value: &Value, result: &mut Value, depth: usize) {
        for item in value {
            match item {
                ValueItem::MacroKey(key) if depth < MAX_MACRO_DEPTH => {
                    if let Some(definition) = self.macro_value(key) {
                        self.expand_into(definition, result, depth + 1);
                    } else if let Some(month) = month_name(key) {
                        result.push(ValueItem::PlainText(month.to_string()));
                    } else {
                        result.push(item.clone());
                    }
                }
                _ => result.push(item.clone()),
            }
        }
    }
}

impl<'a> IntoIterator for &'a File {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Comment, Macro};

    fn sample() -> File {
        let mut file = File::new();
        file.push(Macro::new("jphys", Value::plain("Journal of Physics")));
        file.push(Entry::new("article", "Smith2024").with_field("journal", Value::macro_key("jphys")));
        file.push(Comment::new("a comment", true));
        file.push(Entry::new("book", "Doe2020").with_field("title", Value::plain("First")));
        file
    }

    #[test]
    fn test_contains_key_by_kind() {
        let file = sample();
        assert!(file.contains_key("jphys", KeyFilter::Macros).is_some());
        assert!(file.contains_key("jphys", KeyFilter::Entries).is_none());
        assert!(file.entry("Smith2024").is_some());
        assert!(file.entry("smith2024").is_some());
        assert!(file.entry("Nobody").is_none());
    }

    #[test]
    fn test_last_inserted_shadows() {
        let mut file = sample();
        file.push(Entry::new("book", "Doe2020").with_field("title", Value::plain("Second")));

        assert_eq!(file.entry("Doe2020").unwrap().text("title").as_deref(), Some("Second"));
        assert_eq!(file.duplicate_keys(), vec!["Doe2020"]);
    }

    #[test]
    fn test_exact_match_beats_case_insensitive() {
        let mut file = File::new();
        file.push(Entry::new("misc", "abc"));
        file.push(Entry::new("book", "ABC"));
        assert!(file.entry("abc").unwrap().is_type("misc"));
        assert!(file.entry("Abc").unwrap().is_type("book"));
    }

    #[test]
    fn test_expand_macros() {
        let file = sample();
        let value = Value::from_items(vec![
            ValueItem::MacroKey("jphys".into()),
            ValueItem::PlainText(", ".into()),
            ValueItem::MacroKey("feb".into()),
            ValueItem::MacroKey("unknown".into()),
        ]);
        let expanded = file.expand_macros(&value);
        assert_eq!(
            expanded.items(),
            &[
                ValueItem::PlainText("Journal of Physics".into()),
                ValueItem::PlainText(", ".into()),
                ValueItem::PlainText("February".into()),
                ValueItem::MacroKey("unknown".into()),
            ]
        );
    }

    #[test]
    fn test_self_referencing_macro_terminates() {
        let mut file = File::new();
        file.push(Macro::new("loop", Value::macro_key("loop")));
        let expanded = file.expand_macros(&Value::macro_key("loop"));
        assert_eq!(expanded, Value::macro_key("loop"));
    }

    #[test]
    fn test_insert_remove_and_unique_values() {
        let mut file = sample();
        file.insert(100, Entry::new("book", "Late").with_field("title", Value::plain("First")));
        assert_eq!(file.len(), 5);
        assert_eq!(file.unique_entry_values("title"), vec!["First".to_string()]);
        assert!(file.remove(10).is_none());
        assert!(matches!(file.remove(0), Some(Element::Macro(_))));
        assert_eq!(file.all_keys(KeyFilter::Any), vec!["Smith2024", "Doe2020", "Late"]);
    }
}
