//! Bibliographic data model
//!
//! This crate provides the in-memory model shared by readers and writers of
//! bibliography files:
//! - Value: ordered pieces of a field (text, verbatim text, person, keyword, macro key)
//! - Element: Entry, Macro, Comment and Preamble records
//! - File: ordered elements with key lookup and file properties
//! - BibTeXStyle: field and entry-type descriptions used for casing and typing
//! - Validation of entries against required fields

pub mod description;
pub mod element;
pub mod entry;
pub mod file;
pub mod properties;
pub mod validation;
pub mod value;

pub use description::{BibTeXStyle, EntryDescription, FieldDescription, StyleError, TypeFlag};
pub use element::{Comment, Element, KeyFilter, Macro, Preamble};
pub use entry::{fields, types, Entry, FieldMap};
pub use file::{month_name, File, MONTHS};
pub use properties::{
    is_latex_encoding, FileProperties, KeywordCasing, PersonNameFormat, QuoteComment,
    StringDelimiter, LATEX_ENCODING,
};
pub use validation::{is_valid, validate_entry, ValidationError, ValidationSeverity};
pub use value::{Person, Value, ValueItem};
