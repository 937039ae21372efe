//! Bibliographic entries and their case-insensitive field map

use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Value;

/// Well-known field names, lower case.
pub mod fields {
    pub const ABSTRACT: &str = "abstract";
    pub const ADDRESS: &str = "address";
    pub const AUTHOR: &str = "author";
    pub const BOOKTITLE: &str = "booktitle";
    pub const CHAPTER: &str = "chapter";
    pub const CROSSREF: &str = "crossref";
    pub const DOI: &str = "doi";
    pub const EDITION: &str = "edition";
    pub const EDITOR: &str = "editor";
    pub const EPRINT: &str = "eprint";
    pub const FILE: &str = "file";
    pub const HOWPUBLISHED: &str = "howpublished";
    pub const INSTITUTION: &str = "institution";
    pub const ISBN: &str = "isbn";
    pub const ISSN: &str = "issn";
    pub const JOURNAL: &str = "journal";
    pub const KEY: &str = "key";
    pub const KEYWORDS: &str = "keywords";
    pub const LOCALFILE: &str = "localfile";
    pub const MONTH: &str = "month";
    pub const NOTE: &str = "note";
    pub const NUMBER: &str = "number";
    pub const ORGANIZATION: &str = "organization";
    pub const PAGES: &str = "pages";
    pub const PUBLISHER: &str = "publisher";
    pub const SCHOOL: &str = "school";
    pub const SERIES: &str = "series";
    pub const TITLE: &str = "title";
    pub const TYPE: &str = "type";
    pub const URL: &str = "url";
    pub const VOLUME: &str = "volume";
    pub const YEAR: &str = "year";

    /// Fields whose casing bibliography styles tend to destroy
    pub const TITLE_LIKE: [&str; 3] = [TITLE, BOOKTITLE, SERIES];

    /// Whether `name` is one of [`TITLE_LIKE`] (case-insensitive)
    pub fn is_title_like(name: &str) -> bool {
        TITLE_LIKE.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Well-known entry types, lower case.
pub mod types {
    pub const ARTICLE: &str = "article";
    pub const BOOK: &str = "book";
    pub const BOOKLET: &str = "booklet";
    pub const INBOOK: &str = "inbook";
    pub const INCOLLECTION: &str = "incollection";
    pub const INPROCEEDINGS: &str = "inproceedings";
    pub const MANUAL: &str = "manual";
    pub const MASTERSTHESIS: &str = "mastersthesis";
    pub const MISC: &str = "misc";
    pub const PHDTHESIS: &str = "phdthesis";
    pub const PROCEEDINGS: &str = "proceedings";
    pub const TECHREPORT: &str = "techreport";
    pub const UNPUBLISHED: &str = "unpublished";
}

#[derive(Debug, Clone)]
struct FieldSlot {
    name: String,
    value: Value,
}

/// Field name → value map with case-insensitive keys.
///
/// Keys are normalized to lower case; the spelling used by the first
/// insertion is kept for output. Iteration follows insertion order.
/// Equality ignores field order and name spelling.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    slots: IndexMap<String, FieldSlot>,
}

impl PartialEq for FieldMap {
    fn eq(&self, other: &Self) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .all(|(key, slot)| other.slots.get(key).is_some_and(|o| o.value == slot.value))
    }
}

impl Eq for FieldMap {}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    ///
    /// Replacing keeps the first-seen spelling and position of the name and
    /// returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        let key = name.to_lowercase();
        match self.slots.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(&mut slot.value, value)),
            None => {
                self.slots.insert(key, FieldSlot { name, value });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(&name.to_lowercase()).map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.slots
            .get_mut(&name.to_lowercase())
            .map(|slot| &mut slot.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(&name.to_lowercase())
    }

    /// Remove a field, keeping the order of the remaining ones
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.slots
            .shift_remove(&name.to_lowercase())
            .map(|slot| slot.value)
    }

    /// Field names in their stored spelling
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.values().map(|slot| slot.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots
            .values()
            .map(|slot| (slot.name.as_str(), &slot.value))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut fields = FieldMap::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    fields.insert(name, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// A bibliographic record such as `@article{id, ...}`
///
/// Entry types are compared ignoring case; ids are compared exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub entry_type: String,
    pub id: String,
    pub fields: FieldMap,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.is_type(&other.entry_type) && self.id == other.id && self.fields == other.fields
    }
}

impl Eq for Entry {}

impl Entry {
    pub fn new(entry_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            id: id.into(),
            fields: FieldMap::new(),
        }
    }

    /// Insert or replace a field (case-insensitive name)
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name, value)
    }

    /// Builder form of [`Entry::insert`]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name, value);
        self
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Plain text of a field, if present
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(Value::text)
    }

    /// Whether the entry type matches `entry_type`, ignoring case
    pub fn is_type(&self, entry_type: &str) -> bool {
        self.entry_type.eq_ignore_ascii_case(entry_type)
    }

    /// Id of the entry named by the `crossref` field, if non-empty
    pub fn crossref(&self) -> Option<String> {
        self.text(fields::CROSSREF)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_access() {
        let mut entry = Entry::new("article", "Smith2024");
        entry.insert("Author", Value::plain("John Smith"));

        assert!(entry.contains("author"));
        assert!(entry.contains("AUTHOR"));
        assert_eq!(entry.text("aUtHoR").as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_replace_keeps_first_spelling_and_position() {
        let mut entry = Entry::new("article", "x");
        entry.insert("Title", Value::plain("First"));
        entry.insert("year", Value::plain("2024"));
        let old = entry.insert("TITLE", Value::plain("Second"));

        assert_eq!(old, Some(Value::plain("First")));
        let names: Vec<&str> = entry.fields.names().collect();
        assert_eq!(names, vec!["Title", "year"]);
        assert_eq!(entry.text("title").as_deref(), Some("Second"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut entry = Entry::new("book", "x")
            .with_field("a", Value::plain("1"))
            .with_field("b", Value::plain("2"))
            .with_field("c", Value::plain("3"));

        assert_eq!(entry.remove("B"), Some(Value::plain("2")));
        assert!(entry.remove("b").is_none());
        let names: Vec<&str> = entry.fields.names().collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_crossref_text() {
        let entry = Entry::new("inproceedings", "child")
            .with_field("CrossRef", Value::verbatim("  parent "));
        assert_eq!(entry.crossref().as_deref(), Some("parent"));

        let empty = Entry::new("inproceedings", "child").with_field("crossref", Value::new());
        assert!(empty.crossref().is_none());
    }

    #[test]
    fn test_field_map_json_keeps_order() {
        let entry = Entry::new("misc", "x")
            .with_field("Zeta", Value::plain("z"))
            .with_field("alpha", Value::plain("a"));
        let json = serde_json::to_string(&entry.fields).unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("alpha").unwrap());

        let back: FieldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry.fields);
    }

    #[test]
    fn test_equality_ignores_spelling_and_order() {
        let a = Entry::new("article", "x")
            .with_field("Title", Value::plain("T"))
            .with_field("year", Value::plain("2024"));
        let b = Entry::new("article", "x")
            .with_field("YEAR", Value::plain("2024"))
            .with_field("title", Value::plain("T"));
        assert_eq!(a, b);
        assert_eq!(a, Entry { entry_type: "Article".to_string(), ..b.clone() });
        assert_ne!(a, b.clone().with_field("title", Value::plain("U")));
    }
}
