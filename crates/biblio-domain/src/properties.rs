//! File-level properties: how a bibliography was (or should be) written

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the pseudo-encoding that writes non-ASCII text as LaTeX commands
pub const LATEX_ENCODING: &str = "LaTeX";

/// Whether `encoding` names the LaTeX pseudo-encoding
pub fn is_latex_encoding(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case(LATEX_ENCODING)
}

/// Delimiter pair around string values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringDelimiter {
    #[default]
    #[serde(rename = "{}", alias = "braces")]
    Braces,
    #[serde(rename = "\"\"", alias = "quotes")]
    Quotes,
    #[serde(rename = "()", alias = "parentheses")]
    Parentheses,
}

impl StringDelimiter {
    pub fn open(self) -> char {
        match self {
            StringDelimiter::Braces => '{',
            StringDelimiter::Quotes => '"',
            StringDelimiter::Parentheses => '(',
        }
    }

    pub fn close(self) -> char {
        match self {
            StringDelimiter::Braces => '}',
            StringDelimiter::Quotes => '"',
            StringDelimiter::Parentheses => ')',
        }
    }
}

/// How comments are written back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteComment {
    /// Bare text between records
    #[default]
    None,
    /// `@comment{...}`
    Command,
    /// Every line prefixed with `% `
    PercentSign,
}

/// Spelling of entry types, field names and command words on output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeywordCasing {
    #[default]
    #[serde(rename = "lowercase")]
    LowerCase,
    InitialCapital,
    UpperCamelCase,
    #[serde(rename = "lowerCamelCase")]
    LowerCamelCase,
    #[serde(rename = "UPPERCASE")]
    UpperCase,
}

impl KeywordCasing {
    /// Classify how a keyword as written in a file is cased.
    ///
    /// Returns `None` for tokens without letters.
    pub fn of(token: &str) -> Option<Self> {
        let mut letters = token.chars().filter(|c| c.is_alphabetic());
        let first = letters.next()?;
        let rest: Vec<char> = letters.collect();
        let rest_has_upper = rest.iter().any(|c| c.is_uppercase());
        let rest_has_lower = rest.iter().any(|c| c.is_lowercase());

        Some(if first.is_lowercase() {
            if rest_has_upper {
                KeywordCasing::LowerCamelCase
            } else {
                KeywordCasing::LowerCase
            }
        } else if rest.is_empty() || (rest_has_lower && !rest_has_upper) {
            KeywordCasing::InitialCapital
        } else if !rest_has_lower {
            KeywordCasing::UpperCase
        } else {
            KeywordCasing::UpperCamelCase
        })
    }
}

/// Order of name parts when writing persons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonNameFormat {
    /// `von Last, First`
    #[default]
    LastFirst,
    /// `First von Last`
    FirstLast,
}

/// Typed property bag of a file.
///
/// `None` means the property is unknown; writers fall back to their
/// configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_delimiter: Option<StringDelimiter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_comment: Option<QuoteComment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_casing: Option<KeywordCasing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protect_casing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_formatting: Option<PersonNameFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted_by_identifier: Option<bool>,
    /// Where the file was loaded from, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}
