//! Field and entry-type descriptions ("style")
//!
//! The style tells readers how to interpret a field (person list, keywords,
//! verbatim text, ...) and tells writers the canonical camel-case spelling of
//! field names and entry types. It is plain data: construct it once with
//! [`BibTeXStyle::builtin`] or load it from a TOML/JSON resource, then pass it
//! by reference to the parser and formatter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::Entry;
use crate::properties::KeywordCasing;

/// Errors loading a style resource
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Invalid TOML style: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON style: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the content of a field is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFlag {
    /// Ordinary text, LaTeX-decoded on read and encoded on write
    #[default]
    PlainText,
    /// List of persons separated by " and "
    Person,
    /// List of keywords separated by ";" or ","
    Keyword,
    /// Id of another element (crossref)
    Reference,
    /// Text taken as-is (URLs, DOIs, file names)
    Verbatim,
    /// Raw BibTeX source, never transformed
    Source,
}

impl TypeFlag {
    /// Whether text of this kind bypasses LaTeX decoding and encoding
    pub fn is_raw(self) -> bool {
        matches!(self, TypeFlag::Reference | TypeFlag::Verbatim | TypeFlag::Source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub upper_camel_case: String,
    /// Second name of a combined alias such as "Author or Editor"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_camel_case_alt: Option<String>,
    pub label: String,
    #[serde(default)]
    pub preferred_type: TypeFlag,
    #[serde(default)]
    pub type_flags: Vec<TypeFlag>,
}

impl FieldDescription {
    fn is_combined(&self) -> bool {
        self.upper_camel_case_alt
            .as_deref()
            .is_some_and(|alt| !alt.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDescription {
    pub upper_camel_case: String,
    pub label: String,
    /// Required fields; `a|b` is satisfied by either field
    #[serde(default)]
    pub required_items: Vec<String>,
    #[serde(default)]
    pub optional_items: Vec<String>,
}

/// Field and entry-type tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibTeXStyle {
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    #[serde(default)]
    pub entries: Vec<EntryDescription>,
}

fn field(name: &str, label: &str, preferred: TypeFlag) -> FieldDescription {
    let mut type_flags = vec![preferred];
    if preferred != TypeFlag::Source {
        type_flags.push(TypeFlag::Source);
    }
    FieldDescription {
        upper_camel_case: name.to_string(),
        upper_camel_case_alt: None,
        label: label.to_string(),
        preferred_type: preferred,
        type_flags,
    }
}

fn combined(name: &str, alt: &str, label: &str, preferred: TypeFlag) -> FieldDescription {
    FieldDescription {
        upper_camel_case_alt: Some(alt.to_string()),
        ..field(name, label, preferred)
    }
}

fn entry(name: &str, label: &str, required: &[&str], optional: &[&str]) -> EntryDescription {
    EntryDescription {
        upper_camel_case: name.to_string(),
        label: label.to_string(),
        required_items: required.iter().map(|s| s.to_string()).collect(),
        optional_items: optional.iter().map(|s| s.to_string()).collect(),
    }
}

impl BibTeXStyle {
    /// The standard BibTeX field and entry tables
    pub fn builtin() -> Self {
        use TypeFlag::*;

        let fields = vec![
            field("Abstract", "Abstract", PlainText),
            field("Address", "Address", PlainText),
            field("Author", "Author", Person),
            combined("Author", "Editor", "Author or Editor", Person),
            field("BookTitle", "Book Title", PlainText),
            field("Chapter", "Chapter", PlainText),
            field("Comment", "Comment", PlainText),
            field("CrossRef", "Cross Reference", Reference),
            field("DOI", "DOI", Verbatim),
            field("Edition", "Edition", PlainText),
            field("Editor", "Editor", Person),
            field("Eprint", "E-Print", Verbatim),
            field("File", "File", Verbatim),
            field("HowPublished", "How Published", PlainText),
            field("Institution", "Institution", PlainText),
            combined("School", "Institution", "School or Institution", PlainText),
            field("ISBN", "ISBN", PlainText),
            field("ISSN", "ISSN", PlainText),
            field("Journal", "Journal", PlainText),
            field("Key", "Key", PlainText),
            field("Keywords", "Keywords", Keyword),
            field("LocalFile", "Local File", Verbatim),
            field("Month", "Month", PlainText),
            field("Note", "Note", PlainText),
            field("Number", "Number", PlainText),
            field("Organization", "Organization", PlainText),
            field("Pages", "Pages", PlainText),
            field("Publisher", "Publisher", PlainText),
            field("School", "School", PlainText),
            field("Series", "Series", PlainText),
            field("Title", "Title", PlainText),
            field("Type", "Type", PlainText),
            field("URL", "URL", Verbatim),
            field("Volume", "Volume", PlainText),
            field("Year", "Year", PlainText),
        ];

        let entries = vec![
            entry(
                "Article",
                "Journal Article",
                &["author", "title", "journal", "year"],
                &["volume", "number", "pages", "month", "note", "doi", "url"],
            ),
            entry(
                "Book",
                "Book",
                &["author|editor", "title", "publisher", "year"],
                &["volume", "number", "series", "address", "edition", "month", "note", "isbn"],
            ),
            entry(
                "Booklet",
                "Booklet",
                &["title"],
                &["author", "howpublished", "address", "month", "year", "note"],
            ),
            entry(
                "InBook",
                "Part of a Book",
                &["author|editor", "title", "chapter|pages", "publisher", "year"],
                &["volume", "number", "series", "type", "address", "edition", "month", "note"],
            ),
            entry(
                "InCollection",
                "Part of a Collection",
                &["author", "title", "booktitle", "publisher", "year"],
                &["editor", "volume", "number", "series", "type", "chapter", "pages", "address"],
            ),
            entry(
                "InProceedings",
                "Conference Paper",
                &["author", "title", "booktitle", "year"],
                &["editor", "volume", "number", "series", "pages", "address", "organization", "publisher"],
            ),
            entry(
                "Manual",
                "Manual",
                &["title"],
                &["author", "organization", "address", "edition", "month", "year", "note"],
            ),
            entry(
                "MastersThesis",
                "Master's Thesis",
                &["author", "title", "school", "year"],
                &["type", "address", "month", "note"],
            ),
            entry(
                "Misc",
                "Miscellaneous",
                &[],
                &["author", "title", "howpublished", "month", "year", "note", "url"],
            ),
            entry(
                "Online",
                "Online Resource",
                &["title", "url"],
                &["author", "year", "note"],
            ),
            entry(
                "PhdThesis",
                "PhD Thesis",
                &["author", "title", "school", "year"],
                &["type", "address", "month", "note"],
            ),
            entry(
                "Proceedings",
                "Conference Proceedings",
                &["title", "year"],
                &["editor", "volume", "number", "series", "address", "month", "organization", "publisher"],
            ),
            entry(
                "TechReport",
                "Technical Report",
                &["author", "title", "institution", "year"],
                &["type", "number", "address", "month", "note"],
            ),
            entry(
                "Unpublished",
                "Unpublished",
                &["author", "title", "note"],
                &["month", "year"],
            ),
        ];

        Self { fields, entries }
    }

    /// Load a style resource from TOML (`[[fields]]`, `[[entries]]` tables)
    pub fn from_toml(source: &str) -> Result<Self, StyleError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Description of a single (non-combined) field, case-insensitive
    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields
            .iter()
            .find(|fd| !fd.is_combined() && fd.upper_camel_case.eq_ignore_ascii_case(name))
    }

    /// Description of an entry type, case-insensitive
    pub fn entry(&self, entry_type: &str) -> Option<&EntryDescription> {
        self.entries
            .iter()
            .find(|ed| ed.upper_camel_case.eq_ignore_ascii_case(entry_type))
    }

    /// How a field's content is interpreted; unknown fields are plain text
    pub fn type_flag(&self, name: &str) -> TypeFlag {
        self.field(name)
            .map(|fd| fd.preferred_type)
            .unwrap_or_default()
    }

    /// Spell a field name according to `casing`
    pub fn format_field(&self, name: &str, casing: KeywordCasing) -> String {
        let canonical = self.field(name).map(|fd| fd.upper_camel_case.as_str());
        format_keyword(name, canonical, casing)
    }

    /// Spell an entry type according to `casing`
    pub fn format_entry_type(&self, entry_type: &str, casing: KeywordCasing) -> String {
        let canonical = self.entry(entry_type).map(|ed| ed.upper_camel_case.as_str());
        format_keyword(entry_type, canonical, casing)
    }

    /// Human-readable label of an entry type, falling back to the type itself
    pub fn entry_label<'a>(&'a self, entry: &'a Entry) -> &'a str {
        self.entry(&entry.entry_type)
            .map(|ed| ed.label.as_str())
            .unwrap_or(&entry.entry_type)
    }
}

/// Spell `name` in `casing`, using `canonical` for the camel-case variants
pub fn format_keyword(name: &str, canonical: Option<&str>, casing: KeywordCasing) -> String {
    let lower = name.to_lowercase();
    match casing {
        KeywordCasing::LowerCase => lower,
        KeywordCasing::UpperCase => name.to_uppercase(),
        KeywordCasing::InitialCapital => capitalize_first(&lower),
        KeywordCasing::UpperCamelCase => match canonical {
            Some(camel) => camel.to_string(),
            None => capitalize_first(&lower),
        },
        KeywordCasing::LowerCamelCase => match canonical {
            Some(camel) => lowercase_first(camel),
            None => lower,
        },
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
