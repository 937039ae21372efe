//! Cross-reference resolution
//!
//! An entry with `crossref = {parent}` inherits every field it lacks from
//! the parent entry. The parent's title becomes the child's booktitle.

use biblio_domain::{fields, Element, Entry, File};
use tracing::debug;

/// Resolve the crossref of `entry` against `file`.
///
/// Returns a new entry; neither input is modified. The `crossref` field is
/// always removed, also when the parent cannot be found.
pub fn resolve_crossref(entry: &Entry, file: &File) -> Entry {
    let mut resolved = entry.clone();

    if let Some(parent_id) = entry.crossref() {
        match file.entry(&parent_id) {
            Some(parent) => inherit(&mut resolved, parent),
            None => debug!(id = %entry.id, crossref = %parent_id, "crossref target not found"),
        }
    }

    resolved.remove(fields::CROSSREF);
    resolved
}

fn inherit(child: &mut Entry, parent: &Entry) {
    for (name, value) in parent.fields.iter() {
        if name.eq_ignore_ascii_case(fields::CROSSREF) {
            continue;
        }
        if name.eq_ignore_ascii_case(fields::TITLE) {
            if !child.contains(fields::BOOKTITLE) {
                child.insert(fields::BOOKTITLE, value.clone());
            }
            continue;
        }
        if !child.contains(name) {
            child.insert(name, value.clone());
        }
    }
}

/// Resolve every entry of `file` into a new file.
///
/// Macros, comments and preambles are copied unchanged, as are the file
/// properties.
pub fn resolve_all(file: &File) -> File {
    let elements = file
        .iter()
        .map(|element| match element {
            Element::Entry(entry) => Element::Entry(resolve_crossref(entry, file)),
            other => other.clone(),
        })
        .collect();

    File {
        elements,
        properties: file.properties.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_domain::Value;

    fn file_with_parent() -> File {
        let mut file = File::new();
        file.push(
            Entry::new("proceedings", "conf2024")
                .with_field("title", Value::plain("Proceedings of Things"))
                .with_field("year", Value::plain("2024"))
                .with_field("publisher", Value::plain("ACM"))
                .with_field("crossref", Value::verbatim("series")),
        );
        file
    }

    #[test]
    fn test_inherits_absent_fields() {
        let file = file_with_parent();
        let child = Entry::new("inproceedings", "paper")
            .with_field("title", Value::plain("A Paper"))
            .with_field("year", Value::plain("2023"))
            .with_field("crossref", Value::verbatim("conf2024"));

        let resolved = resolve_crossref(&child, &file);
        assert_eq!(resolved.text("title").as_deref(), Some("A Paper"));
        assert_eq!(resolved.text("booktitle").as_deref(), Some("Proceedings of Things"));
        assert_eq!(resolved.text("year").as_deref(), Some("2023"));
        assert_eq!(resolved.text("publisher").as_deref(), Some("ACM"));
        assert!(!resolved.contains("crossref"));

        // inputs untouched
        assert!(child.contains("crossref"));
        assert_eq!(file.len(), 1);
    }

    #[test]
    fn test_existing_booktitle_is_kept() {
        let file = file_with_parent();
        let child = Entry::new("inproceedings", "paper")
            .with_field("BookTitle", Value::plain("Own Book"))
            .with_field("CrossRef", Value::verbatim("CONF2024"));

        let resolved = resolve_crossref(&child, &file);
        assert_eq!(resolved.text("booktitle").as_deref(), Some("Own Book"));
        assert!(!resolved.contains("title"));
        assert_eq!(resolved.text("publisher").as_deref(), Some("ACM"));
        assert!(!resolved.contains("crossref"));
    }

    #[test]
    fn test_unknown_target_only_drops_crossref() {
        let file = file_with_parent();
        let child = Entry::new("inproceedings", "paper")
            .with_field("title", Value::plain("T"))
            .with_field("crossref", Value::verbatim("nowhere"));

        let resolved = resolve_crossref(&child, &file);
        let expected = Entry::new("inproceedings", "paper").with_field("title", Value::plain("T"));
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_resolve_all() {
        let mut file = file_with_parent();
        file.push(
            Entry::new("inproceedings", "paper").with_field("crossref", Value::verbatim("conf2024")),
        );

        let resolved = resolve_all(&file);
        assert_eq!(resolved.len(), 2);
        let paper = resolved.entry("paper").unwrap();
        assert_eq!(paper.text("year").as_deref(), Some("2024"));
        // the parent's own dangling crossref is removed too
        assert!(!resolved.entry("conf2024").unwrap().contains("crossref"));
        assert!(file.entry("paper").unwrap().contains("crossref"));
    }
}
