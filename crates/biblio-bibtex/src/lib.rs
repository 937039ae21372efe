//! BibTeX parsing and formatting
//!
//! This crate reads and writes BibTeX files on top of the `biblio-domain`
//! model, keeping enough of the original layout (delimiters, casing, name
//! order, comment style) that a parsed file is written back the way it was
//! found.
//!
//! Features:
//! - Parser that never fails and reports recoverable anomalies as warnings
//! - LaTeX special character decoding and encoding
//! - Person name splitting and formatting
//! - Crossref resolution and identifier sorting
//! - UTF-8, ISO-8859-1 and US-ASCII byte encodings

pub mod codec;
pub mod config;
pub mod crossref;
mod error;
pub mod formatter;
pub mod latex;
pub mod names;
pub mod options;
pub mod parser;
pub mod sort;

pub use codec::{load, save};
pub use config::Config;
pub use crossref::{resolve_all, resolve_crossref};
pub use error::{BibTeXError, ParseWarning, Result, WarningKind};
pub use formatter::{format_element, format_file, format_file_default, Formatter};
pub use latex::{decode as decode_latex, encode as encode_latex, Charset};
pub use options::SerializerOptions;
pub use parser::{parse, parse_with_style, BibTeXParseResult};
pub use sort::{move_crossrefed_to_end, sort_by_identifier};
