//! Validation of entries against the style's required fields

use serde::{Deserialize, Serialize};

use crate::description::BibTeXStyle;
use crate::entry::Entry;

/// Severity of a validation error
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// A validation error or warning
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: ValidationSeverity,
}

/// Validate an entry and return errors/warnings.
///
/// Missing required fields are errors. Unknown entry types only get a
/// warning since any token is a legal entry type.
pub fn validate_entry(entry: &Entry, style: &BibTeXStyle) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if entry.id.trim().is_empty() {
        errors.push(ValidationError {
            field: "id".to_string(),
            message: "Entry id is required".to_string(),
            severity: ValidationSeverity::Error,
        });
    }

    let Some(description) = style.entry(&entry.entry_type) else {
        errors.push(ValidationError {
            field: "entry_type".to_string(),
            message: format!("Unknown entry type '{}'", entry.entry_type),
            severity: ValidationSeverity::Warning,
        });
        return errors;
    };

    for item in &description.required_items {
        let present = item
            .split('|')
            .any(|name| entry.text(name).is_some_and(|text| !text.trim().is_empty()));
        if !present {
            errors.push(ValidationError {
                field: item.clone(),
                message: format!(
                    "'{}' is required for {} entries",
                    item.replace('|', "' or '"),
                    description.label
                ),
                severity: ValidationSeverity::Error,
            });
        }
    }

    errors
}

/// Check if an entry is valid (no errors)
pub fn is_valid(entry: &Entry, style: &BibTeXStyle) -> bool {
    validate_entry(entry, style)
        .iter()
        .all(|e| e.severity != ValidationSeverity::Error)
}
