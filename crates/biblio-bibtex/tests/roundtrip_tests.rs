//! Round-trip tests: parsed files are written back the way they were read

mod common;

use biblio_bibtex::{format_file, format_file_default, parse, SerializerOptions};
use biblio_domain::{BibTeXStyle, Entry, File, KeywordCasing, StringDelimiter, Value};
use common::fixtures::load_bibtex_fixture;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("canonical.bib")]
#[case("sort_shuffled.bib")]
#[case("crossref_to_end.bib")]
#[case("macros_only.bib")]
fn test_canonical_text_is_reproduced(#[case] name: &str) {
    let text = load_bibtex_fixture(name);
    let file = parse(&text).file;
    assert_eq!(format_file_default(&file), text);
}

#[rstest]
#[case("canonical.bib")]
#[case("mixed.bib")]
#[case("crossref_to_end.bib")]
fn test_parse_format_parse(#[case] name: &str) {
    let first = parse(&load_bibtex_fixture(name)).file;
    let written = format_file_default(&first);
    let second = parse(&written);

    assert!(second.warnings.is_empty(), "{:?}", second.warnings);
    assert_eq!(second.file, first);
    assert_eq!(format_file_default(&second.file), written);
}

#[test]
fn test_math_and_urls_survive_saving() {
    let text = "@article{a,\n    title = {{Bounds for $x_i$ and $a^2$}},\n    note = {Holds for $x_i$ \\& see \\url{http://x.org/#a}},\n}\n";
    let written = format_file_default(&parse(text).file);

    assert_eq!(written, text);
    assert!(written.contains("$x_i$"));
    assert!(written.contains(r"\url{http://x.org/#a}"));
}

#[test]
fn test_mixed_fixture_keeps_its_style() {
    let written = format_file_default(&parse(&load_bibtex_fixture("mixed.bib")).file);

    assert!(written.starts_with("% Exported by a reference manager\n% Do not edit\n\n"));
    assert!(written.contains("@STRING{ieee = \"IEEE Transactions\"}"));
    assert!(written.contains("@ARTICLE{Knuth1984,\n    AUTHOR = \"Donald E. Knuth\",\n"));
    assert!(written.contains("    JOURNAL = ieee # \" on Software\",\n"));
    assert!(written.contains("    YEAR = 1984,\n"));
    assert!(written.contains("    KEYWORDS = \"programming; documentation\",\n"));
    assert!(written.contains("    TITLE = \"{LaTeX}: A Document Preparation System\",\n"));
    assert!(written.ends_with("% trailing notes\n"));
}

#[test]
fn test_options_override_file_style() {
    let file = parse(&load_bibtex_fixture("mixed.bib")).file;
    let options = SerializerOptions {
        string_delimiter: StringDelimiter::Braces,
        keyword_casing: KeywordCasing::LowerCase,
        encoding: "UTF-8".to_string(),
        ..SerializerOptions::default()
    };
    let written = format_file(&file, &options, &BibTeXStyle::builtin());

    assert!(written.starts_with("@comment{x-kbibtex-encoding=UTF-8}\n\n"));
    assert!(written.contains("@book{Lamport1994,\n    author = {Lamport, Leslie and García, José},\n"));

    let reread = parse(&written).file;
    assert_eq!(reread.properties.encoding.as_deref(), Some("UTF-8"));
    assert!(reread.entries().eq(file.entries()));
}

// === Properties ===

fn plain_file(entries: &[(String, Vec<(String, String)>)]) -> File {
    let mut file = File::new();
    for (id, fields) in entries {
        let mut entry = Entry::new("misc", id.clone());
        for (name, text) in fields {
            entry.insert(name.clone(), Value::plain(text.clone()));
        }
        file.push(entry);
    }
    file
}

fn field_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["note", "publisher", "address", "edition", "howpublished", "x-custom"])
        .prop_map(str::to_string)
}

fn words() -> impl Strategy<Value = String> {
    "[A-Za-z&%_][A-Za-z]{0,8}( [A-Za-z]{1,8}){0,3}"
}

fn entries() -> impl Strategy<Value = Vec<(String, Vec<(String, String)>)>> {
    prop::collection::vec(
        (
            "[A-Za-z][A-Za-z0-9:_-]{0,10}",
            prop::collection::vec((field_name(), words()), 0..4),
        ),
        0..6,
    )
}

proptest! {
    #[test]
    fn prop_plain_entries_round_trip(entries in entries()) {
        let file = plain_file(&entries);
        let reread = parse(&format_file_default(&file)).file;
        prop_assert!(reread.entries().eq(file.entries()));
    }

    #[test]
    fn prop_formatting_is_deterministic(entries in entries()) {
        let file = plain_file(&entries);
        prop_assert_eq!(format_file_default(&file), format_file_default(&file.clone()));
    }

    #[test]
    fn prop_field_lookup_ignores_case(name in field_name(), text in words()) {
        let entry = Entry::new("misc", "x").with_field(name.clone(), Value::plain(text));
        prop_assert_eq!(entry.value(&name.to_uppercase()), entry.value(&name));
        prop_assert!(entry.contains(&name.to_ascii_uppercase()));
    }
}
