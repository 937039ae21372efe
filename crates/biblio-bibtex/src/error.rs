//! Error and warning types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for operations that can fail outside the parser
pub type Result<T> = std::result::Result<T, BibTeXError>;

/// Errors of the outer surfaces (files, configuration, styles).
///
/// Parsing never fails; malformed input only produces [`ParseWarning`]s.
#[derive(Error, Debug)]
pub enum BibTeXError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text that the target charset cannot represent
    #[error("Cannot encode character {character:?} as {encoding}")]
    Encoding { character: char, encoding: String },

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Style error: {0}")]
    Style(#[from] biblio_domain::StyleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Category of a recoverable syntax anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Brace group or quoted string not closed
    UnterminatedValue,
    /// Record not closed before the next record or end of input
    UnterminatedRecord,
    /// Entry without id; a placeholder id was assigned
    MissingId,
    /// Field name not followed by `=`
    MissingAssignment,
    UnexpectedCharacter,
    /// Same field twice in one entry; the first one is kept
    DuplicateField,
    /// Entry id or macro key defined more than once
    DuplicateKey,
    /// `@` followed by something that is not a record
    InvalidRecord,
}

/// Parse warning information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub line: u32,
    pub column: u32,
    pub kind: WarningKind,
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}
