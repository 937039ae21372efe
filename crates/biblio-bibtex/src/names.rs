//! Person name splitting and formatting
//!
//! Names are split with the usual comma-count heuristic:
//! - `First von Last` (no comma)
//! - `von Last, First`
//! - `von Last, Jr, First`
//!
//! Brace groups are opaque, so `{Barnes and Noble}` is one last name.
//! This is not a complete BibTeX name parser.

use biblio_domain::{Person, PersonNameFormat};

/// Split `text` at every top-level occurrence of `pattern` (ASCII
/// case-insensitive), outside brace groups.
fn split_top_level<'a>(text: &'a str, pattern: &str) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let needle = pattern.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'\\' => {
                // An escaped brace does not change the depth
                pos += 2;
                continue;
            }
            _ if depth == 0
                && bytes.len() - pos >= needle.len()
                && bytes[pos..pos + needle.len()].eq_ignore_ascii_case(needle) =>
            {
                parts.push(&text[start..pos]);
                pos += needle.len();
                start = pos;
                continue;
            }
            _ => {}
        }
        pos += 1;
    }

    parts.push(&text[start.min(text.len())..]);
    parts
}

/// Split whitespace-separated tokens, keeping brace groups whole
fn tokens(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0i32;
    let mut start = None;

    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if c.is_whitespace() && depth <= 0 {
            if let Some(s) = start.take() {
                result.push(&text[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        result.push(&text[s..]);
    }
    result
}

fn starts_lowercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_lowercase)
}

/// Split a person list on top-level ` and `
pub fn split_persons(text: &str) -> Vec<&str> {
    split_top_level(text, " and ")
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Parse a single name.
///
/// Returns `None` for blank input. Components are returned as written,
/// without LaTeX decoding.
pub fn parse_person(text: &str) -> Option<Person> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<&str> = split_top_level(text, ",").into_iter().map(str::trim).collect();

    let person = match parts.as_slice() {
        [whole] => {
            let tokens = tokens(whole);
            let last_index = tokens.len().saturating_sub(1);
            // The von part starts at the first lowercase token before the last
            let split = tokens[..last_index]
                .iter()
                .position(|t| starts_lowercase(t))
                .unwrap_or(last_index);
            Person::new(tokens[split..].join(" ")).with_first_name(tokens[..split].join(" "))
        }
        [last, first] => Person::new(*last).with_first_name(*first),
        [last, suffix, rest @ ..] => Person::new(*last)
            .with_suffix(*suffix)
            .with_first_name(rest.join(", ").trim()),
        [] => return None,
    };

    (!person.last_name.is_empty()).then_some(person)
}

/// How a single name was written, for file statistics.
///
/// Single-token names say nothing about the order and return `None`.
pub fn written_form(text: &str) -> Option<PersonNameFormat> {
    if split_top_level(text, ",").len() > 1 {
        Some(PersonNameFormat::LastFirst)
    } else if tokens(text).len() > 1 {
        Some(PersonNameFormat::FirstLast)
    } else {
        None
    }
}

fn last_first(person: &Person) -> String {
    match (&person.first_name, &person.suffix) {
        (Some(first), Some(suffix)) => format!("{}, {}, {}", person.last_name, suffix, first),
        (None, Some(suffix)) => format!("{}, {},", person.last_name, suffix),
        (Some(first), None) => format!("{}, {}", person.last_name, first),
        (None, None) => {
            // A multi-word last name alone would re-parse as First Last
            if parse_person(&person.last_name).as_ref() == Some(person) {
                person.last_name.clone()
            } else {
                format!("{},", person.last_name)
            }
        }
    }
}

/// Write a person in `format`.
///
/// `FirstLast` is only used when the result re-parses to the same person;
/// otherwise the unambiguous `von Last, First` form is written.
pub fn format_person(person: &Person, format: PersonNameFormat) -> String {
    if format == PersonNameFormat::FirstLast && person.suffix.is_none() {
        let candidate = match &person.first_name {
            Some(first) => format!("{} {}", first, person.last_name),
            None => person.last_name.clone(),
        };
        if parse_person(&candidate).as_ref() == Some(person) {
            return candidate;
        }
    }
    last_first(person)
}
