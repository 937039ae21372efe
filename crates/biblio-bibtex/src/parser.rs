//! BibTeX parser implementation using nom
//!
//! This parser handles the BibTeX format including:
//! - @string definitions (kept as macros, forward references allowed)
//! - @preamble declarations
//! - @comment sections and free text between records
//! - All entry types, with `{}` or `()` record delimiters
//! - Braced, quoted and parenthesized values, bare numbers and macro keys
//! - String concatenation with #
//! - Nested braces in field values
//!
//! Parsing never fails. Malformed input produces [`ParseWarning`]s and the
//! parser resumes at the next plausible record.

use std::collections::HashMap;

use biblio_domain::{
    fields, BibTeXStyle, Comment, Entry, File, KeyFilter, KeywordCasing, Macro, Person,
    PersonNameFormat, Preamble, QuoteComment, StringDelimiter, TypeFlag, Value, ValueItem,
};
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0, one_of},
    IResult,
};
use tracing::{debug, warn};

use crate::error::{ParseWarning, WarningKind};
use crate::latex;
use crate::names;

/// Prefix of the comment that declares a file's encoding
pub(crate) const ENCODING_COMMENT: &str = "x-kbibtex-encoding=";

/// Result of parsing a BibTeX file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibTeXParseResult {
    pub file: File,
    pub warnings: Vec<ParseWarning>,
}

/// Parse BibTeX text with the built-in field descriptions
pub fn parse(input: &str) -> BibTeXParseResult {
    parse_with_style(input, &BibTeXStyle::builtin())
}

/// Parse BibTeX text, interpreting fields according to `style`
pub fn parse_with_style(input: &str, style: &BibTeXStyle) -> BibTeXParseResult {
    Parser::new(input, style).run()
}

// ===== Lexical primitives =====

/// `@name` followed by an opening delimiter
fn record_head(input: &str) -> IResult<&str, (&str, char)> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, name) =
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, open) = one_of("{(")(rest)?;
    Ok((rest, (name, open)))
}

/// Field names, macro keys and bare numbers
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || "_-:./+".contains(c))(input)
}

pub(crate) fn is_record_start(input: &str) -> bool {
    record_head(input).is_ok()
}

/// Whether `text` would be read back as containing a record
pub(crate) fn contains_record_start(text: &str) -> bool {
    text.match_indices('@').any(|(i, _)| is_record_start(&text[i..]))
}

fn find_record_start(text: &str) -> Option<usize> {
    text.match_indices('@')
        .map(|(i, _)| i)
        .find(|&i| is_record_start(&text[i..]))
}

/// Offset of the first line (after the first) that starts a record, or
/// the end of `text`. Unterminated constructs are closed there.
fn next_record_line(text: &str) -> usize {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if offset > 0 && is_record_start(line.trim_start()) {
            return offset;
        }
        offset += line.len();
    }
    text.len()
}

/// Offset of the delimiter closing a group whose opening delimiter was just
/// before `input`. Brace groups are opaque; a backslash escapes the next
/// character.
pub(crate) fn find_close(input: &str, close: u8) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut braces = 0i32;
    let mut parens = 0i32;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                pos += 2;
                continue;
            }
            b'{' => braces += 1,
            b'}' => {
                if braces == 0 && close == b'}' {
                    return Some(pos);
                }
                braces = (braces - 1).max(0);
            }
            b'"' if braces == 0 && close == b'"' => return Some(pos),
            b'(' if braces == 0 => parens += 1,
            b')' if braces == 0 => {
                if parens == 0 && close == b')' {
                    return Some(pos);
                }
                parens -= 1;
            }
            _ => {}
        }
        pos += 1;
    }

    None
}

/// Whether the whole of `text` is one brace group, as in `{DNA}`
pub(crate) fn is_protected(text: &str) -> bool {
    text.len() >= 2
        && text.starts_with('{')
        && find_close(&text[1..], b'}') == Some(text.len() - 2)
}

/// Replace whitespace runs by single spaces; `trim` also drops them at the ends
fn collapse_whitespace(text: &str, trim: bool) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            in_space = true;
            continue;
        }
        if in_space && (!trim || !result.is_empty()) {
            result.push(' ');
        }
        in_space = false;
        result.push(c);
    }
    if in_space && !trim {
        result.push(' ');
    }

    result
}

fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    text.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &text[prefix.len()..])
}

/// Remove the leading `%` (and one space) from every line
fn strip_percent(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim_start();
            match line.strip_prefix('%') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whether every non-blank line of `text` starts with `%`
pub(crate) fn is_percent_block(text: &str) -> bool {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty()).peekable();
    lines.peek().is_some() && lines.all(|line| line.trim_start().starts_with('%'))
}

fn decode_person(person: Person) -> Person {
    let mut decoded = Person::new(latex::decode(&person.last_name));
    if let Some(first) = person.first_name {
        decoded = decoded.with_first_name(latex::decode(&first));
    }
    if let Some(suffix) = person.suffix {
        decoded = decoded.with_suffix(latex::decode(&suffix));
    }
    decoded
}

// ===== Statistics =====

/// Counts gathered while parsing, turned into file properties at the end
#[derive(Debug, Default)]
struct Statistics {
    delimiters: HashMap<StringDelimiter, usize>,
    comments: HashMap<QuoteComment, usize>,
    casing: HashMap<KeywordCasing, usize>,
    names: HashMap<PersonNameFormat, usize>,
    protected: usize,
    unprotected: usize,
}

/// The candidate with the highest non-zero count; earlier candidates win ties
fn majority<T: Copy + Eq + std::hash::Hash>(
    counts: &HashMap<T, usize>,
    candidates: &[T],
) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for &candidate in candidates {
        let count = counts.get(&candidate).copied().unwrap_or(0);
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((candidate, count));
        }
    }
    best.map(|(candidate, _)| candidate)
}

impl Statistics {
    /// Count a keyword spelling. A token equal to its canonical camel-case
    /// spelling also counts as upper camel case.
    fn count_keyword(&mut self, token: &str, canonical: Option<&str>) {
        let casing = KeywordCasing::of(token);
        if let Some(casing) = casing {
            *self.casing.entry(casing).or_default() += 1;
        }
        if canonical == Some(token) && casing != Some(KeywordCasing::UpperCamelCase) {
            *self.casing.entry(KeywordCasing::UpperCamelCase).or_default() += 1;
        }
    }

    fn apply(&self, file: &mut File) {
        let ids: Vec<&str> = file.entries().map(|entry| entry.id.as_str()).collect();
        let sorted = (ids.len() >= 2).then(|| ids.windows(2).all(|pair| pair[0] <= pair[1]));

        let properties = &mut file.properties;
        properties.string_delimiter = majority(
            &self.delimiters,
            &[
                StringDelimiter::Braces,
                StringDelimiter::Quotes,
                StringDelimiter::Parentheses,
            ],
        );
        properties.quote_comment = majority(
            &self.comments,
            &[
                QuoteComment::None,
                QuoteComment::Command,
                QuoteComment::PercentSign,
            ],
        );
        properties.keyword_casing = majority(
            &self.casing,
            &[
                KeywordCasing::LowerCase,
                KeywordCasing::UpperCamelCase,
                KeywordCasing::InitialCapital,
                KeywordCasing::LowerCamelCase,
                KeywordCasing::UpperCase,
            ],
        );
        properties.protect_casing = if self.protected > 4 * self.unprotected {
            Some(true)
        } else if self.unprotected > 4 * self.protected {
            Some(false)
        } else {
            None
        };
        properties.name_formatting = majority(
            &self.names,
            &[PersonNameFormat::LastFirst, PersonNameFormat::FirstLast],
        )
        .filter(|_| {
            self.names.get(&PersonNameFormat::LastFirst)
                != self.names.get(&PersonNameFormat::FirstLast)
        });
        properties.sorted_by_identifier = sorted;

        debug!(?properties, "file properties from statistics");
    }
}

// ===== Parser =====

#[derive(Debug, Clone, Copy)]
enum Term<'a> {
    Delimited(&'a str, StringDelimiter),
    Number(&'a str),
    Macro(&'a str),
}

/// A `name = value` pair inside a record, not yet interpreted
struct Assignment<'a> {
    name: &'a str,
    offset: usize,
    terms: Vec<Term<'a>>,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    style: &'a BibTeXStyle,
    line_starts: Vec<usize>,
    file: File,
    warnings: Vec<ParseWarning>,
    stats: Statistics,
    missing_ids: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, style: &'a BibTeXStyle) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let line_starts = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            input,
            pos: 0,
            style,
            line_starts,
            file: File::new(),
            warnings: Vec::new(),
            stats: Statistics::default(),
            missing_ids: 0,
        }
    }

    fn run(mut self) -> BibTeXParseResult {
        while self.pos < self.input.len() {
            let rest = self.rest();
            match find_record_start(rest) {
                Some(offset) => {
                    self.bare_text(&rest[..offset], self.pos);
                    self.pos += offset;
                    self.record();
                }
                None => {
                    self.bare_text(rest, self.pos);
                    self.pos = self.input.len();
                }
            }
        }

        self.stats.apply(&mut self.file);
        BibTeXParseResult {
            file: self.file,
            warnings: self.warnings,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn offset_of(&self, rest: &str) -> usize {
        self.input.len() - rest.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// 1-based line and column (in characters) of a byte offset
    fn location(&self, offset: usize) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line.saturating_sub(1)];
        let column = self
            .input
            .get(start..offset)
            .map_or(0, |prefix| prefix.chars().count());
        (line as u32, column as u32 + 1)
    }

    fn warn(&mut self, offset: usize, kind: WarningKind, message: impl Into<String>) {
        let (line, column) = self.location(offset);
        let message = message.into();
        warn!(line, column, ?kind, "{}", message);
        self.warnings.push(ParseWarning {
            line,
            column,
            kind,
            message,
        });
    }

    /// Text between records becomes a comment
    fn bare_text(&mut self, text: &str, offset: usize) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        for (i, _) in text.match_indices('@') {
            let line_start = text[..i].rsplit('\n').next().unwrap_or("");
            if line_start.trim().is_empty()
                && text[i + 1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.warn(
                    offset + i,
                    WarningKind::InvalidRecord,
                    "'@' without a record body, kept as comment",
                );
            }
        }

        let comment = if is_percent_block(trimmed) {
            *self.stats.comments.entry(QuoteComment::PercentSign).or_default() += 1;
            strip_percent(trimmed)
        } else {
            *self.stats.comments.entry(QuoteComment::None).or_default() += 1;
            trimmed.to_string()
        };
        self.file.push(Comment::new(comment, false));
    }

    fn record(&mut self) {
        let start = self.pos;
        let Ok((rest, (name, open))) = record_head(self.rest()) else {
            self.pos += 1;
            return;
        };
        self.pos = self.offset_of(rest);
        let close = if open == '(' { ')' } else { '}' };

        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "comment" | "string" | "preamble" => {
                let mut canonical = lower.clone();
                canonical[..1].make_ascii_uppercase();
                self.stats.count_keyword(name, Some(&canonical));
            }
            _ => {
                let canonical = self.style.entry(name).map(|ed| ed.upper_camel_case.as_str());
                self.stats.count_keyword(name, canonical);
            }
        }

        match lower.as_str() {
            "comment" => self.comment_body(start, close),
            "string" => self.macro_body(start, close),
            "preamble" => self.preamble_body(start, close),
            _ => self.entry_body(start, name, close),
        }
    }

    fn comment_body(&mut self, start: usize, close: char) {
        let rest = self.rest();
        let content = match find_close(rest, close as u8) {
            Some(end) => {
                self.pos += end + 1;
                &rest[..end]
            }
            None => {
                self.warn(start, WarningKind::UnterminatedRecord, "@comment is not closed");
                let end = next_record_line(rest);
                self.pos += end;
                &rest[..end]
            }
        };

        let text = content.trim();
        if let Some(encoding) = strip_prefix_ignore_case(text, ENCODING_COMMENT) {
            let encoding = encoding.trim();
            debug!(encoding, "encoding declared in file");
            self.file.properties.encoding = Some(encoding.to_string());
            return;
        }

        *self.stats.comments.entry(QuoteComment::Command).or_default() += 1;
        self.file.push(Comment::new(text, true));
    }

    fn macro_body(&mut self, start: usize, close: char) {
        for Assignment {
            name,
            offset,
            terms,
        } in self.assignments(start, close)
        {
            if self.file.contains_key(name, KeyFilter::Macros).is_some() {
                self.warn(
                    offset,
                    WarningKind::DuplicateKey,
                    format!("macro '{}' is defined more than once", name),
                );
            }
            let value = self.interpret("", TypeFlag::PlainText, &terms);
            self.file.push(Macro::new(name, value));
        }
    }

    fn preamble_body(&mut self, start: usize, close: char) {
        self.skip_whitespace();
        let terms = self.value_terms(close);
        self.skip_whitespace();
        if self.rest().starts_with(close) {
            self.pos += 1;
        } else {
            self.warn(start, WarningKind::UnterminatedRecord, "@preamble is not closed");
        }

        let value = terms
            .iter()
            .map(|term| match *term {
                Term::Delimited(content, _) => ValueItem::VerbatimText(content.to_string()),
                Term::Number(number) => ValueItem::PlainText(number.to_string()),
                Term::Macro(key) => ValueItem::MacroKey(key.to_string()),
            })
            .collect();
        self.file.push(Preamble::new(value));
    }

    fn entry_body(&mut self, start: usize, entry_type: &str, close: char) {
        self.skip_whitespace();
        let rest = self.rest();
        let id_len = rest
            .find(|c: char| c.is_whitespace() || ",={}\"#()@".contains(c))
            .unwrap_or(rest.len());
        let candidate = &rest[..id_len];

        // `@article{title = ...` has no id: the token is a field name
        let id = if candidate.is_empty() || rest[id_len..].trim_start().starts_with('=') {
            self.missing_ids += 1;
            let id = format!("missing-id-{}", self.missing_ids);
            self.warn(
                start,
                WarningKind::MissingId,
                format!("entry has no id, using '{}'", id),
            );
            id
        } else {
            self.pos += id_len;
            self.skip_whitespace();
            if self.rest().starts_with(',') {
                self.pos += 1;
            }
            candidate.to_string()
        };

        // ids are case-sensitive; only an exact repeat is a duplicate
        if self.file.all_keys(KeyFilter::Entries).contains(&id.as_str()) {
            self.warn(
                start,
                WarningKind::DuplicateKey,
                format!("entry id '{}' is used more than once", id),
            );
        }

        let mut entry = Entry::new(entry_type, id);
        for Assignment {
            name,
            offset,
            terms,
        } in self.assignments(start, close)
        {
            let canonical = self.style.field(name).map(|fd| fd.upper_camel_case.as_str());
            self.stats.count_keyword(name, canonical);

            if entry.contains(name) {
                self.warn(
                    offset,
                    WarningKind::DuplicateField,
                    format!("field '{}' repeated in '{}', keeping the first", name, entry.id),
                );
                continue;
            }
            let value = self.interpret(name, self.style.type_flag(name), &terms);
            entry.insert(name, value);
        }

        self.file.push(entry);
    }

    /// Read `name = value` pairs up to and including the closing delimiter
    fn assignments(&mut self, start: usize, close: char) -> Vec<Assignment<'a>> {
        let mut result = Vec::new();

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() || is_record_start(rest) {
                self.warn(start, WarningKind::UnterminatedRecord, "record is not closed");
                return result;
            }
            if rest.starts_with(close) {
                self.pos += 1;
                return result;
            }
            if rest.starts_with(',') {
                self.pos += 1;
                continue;
            }

            let offset = self.pos;
            let Ok((after, name)) = identifier(rest) else {
                let c = rest.chars().next().unwrap_or(' ');
                self.warn(
                    offset,
                    WarningKind::UnexpectedCharacter,
                    format!("unexpected character {:?}", c),
                );
                self.pos += c.len_utf8();
                continue;
            };
            self.pos = self.offset_of(after);
            self.skip_whitespace();

            if !self.rest().starts_with('=') {
                self.warn(
                    offset,
                    WarningKind::MissingAssignment,
                    format!("'{}' is not followed by '='", name),
                );
                self.skip_to_separator(close);
                continue;
            }
            self.pos += 1;

            let terms = self.value_terms(close);
            result.push(Assignment {
                name,
                offset,
                terms,
            });
        }
    }

    /// Skip past the next top-level `,`, or up to the closing delimiter
    fn skip_to_separator(&mut self, close: char) {
        let rest = self.rest();
        let limit = next_record_line(rest);
        let mut depth = 0i32;

        for (i, c) in rest[..limit].char_indices() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                ',' if depth == 0 => {
                    self.pos += i + 1;
                    return;
                }
                c if c == close && depth == 0 => {
                    self.pos += i;
                    return;
                }
                _ => {}
            }
        }
        self.pos += limit;
    }

    /// Terms joined by `#`
    fn value_terms(&mut self, close: char) -> Vec<Term<'a>> {
        let mut terms = Vec::new();

        loop {
            self.skip_whitespace();
            match self.term() {
                Some(term) => terms.push(term),
                None => {
                    let rest = self.rest();
                    if !rest.is_empty() && !is_record_start(rest) {
                        let found = rest.chars().next().unwrap_or(close);
                        self.warn(
                            self.pos,
                            WarningKind::UnexpectedCharacter,
                            format!("expected a value, found {:?}", found),
                        );
                    }
                    break;
                }
            }

            self.skip_whitespace();
            match self.rest().strip_prefix('#') {
                Some(_) => self.pos += 1,
                None => break,
            }
        }

        terms
    }

    fn term(&mut self) -> Option<Term<'a>> {
        let rest = self.rest();
        let offset = self.pos;

        let (delimiter, close) = match rest.chars().next()? {
            '{' => (StringDelimiter::Braces, b'}'),
            '"' => (StringDelimiter::Quotes, b'"'),
            '(' => (StringDelimiter::Parentheses, b')'),
            first => {
                let (after, token) = identifier(rest).ok()?;
                self.pos = self.offset_of(after);
                return Some(if first.is_ascii_digit() {
                    Term::Number(token)
                } else {
                    Term::Macro(token)
                });
            }
        };

        let body = &rest[1..];
        let content = match find_close(body, close) {
            Some(end) => {
                self.pos += end + 2;
                &body[..end]
            }
            None => {
                self.warn(offset, WarningKind::UnterminatedValue, "value is not closed");
                let end = next_record_line(body);
                self.pos += end + 1;
                body[..end].trim_end()
            }
        };

        *self.stats.delimiters.entry(delimiter).or_default() += 1;
        Some(Term::Delimited(content, delimiter))
    }

    /// Turn raw terms into a value according to the field's type
    fn interpret(&mut self, name: &str, flag: TypeFlag, terms: &[Term]) -> Value {
        let single = terms.len() == 1;
        let mut value = Value::new();

        for term in terms {
            let content = match *term {
                Term::Macro(key) => {
                    value.push(ValueItem::MacroKey(key.to_string()));
                    continue;
                }
                Term::Number(number) => {
                    value.push(ValueItem::PlainText(number.to_string()));
                    continue;
                }
                Term::Delimited(content, _) => content,
            };

            match flag {
                TypeFlag::Person => self.persons(content, &mut value),
                TypeFlag::Keyword => keywords(content, &mut value),
                flag if flag.is_raw() => value.push(ValueItem::VerbatimText(content.to_string())),
                _ => {
                    let mut content = content;
                    if single && fields::is_title_like(name) {
                        if is_protected(content) {
                            self.stats.protected += 1;
                            content = &content[1..content.len() - 1];
                        } else {
                            self.stats.unprotected += 1;
                        }
                    }
                    let text = collapse_whitespace(&latex::decode(content), single);
                    value.push(ValueItem::PlainText(text));
                }
            }
        }

        value
    }

    fn persons(&mut self, content: &str, value: &mut Value) {
        let text = collapse_whitespace(content, true);
        for part in names::split_persons(&text) {
            if let Some(form) = names::written_form(part) {
                *self.stats.names.entry(form).or_default() += 1;
            }
            if let Some(person) = names::parse_person(part) {
                value.push(ValueItem::Person(decode_person(person)));
            }
        }
    }
}

/// Keywords are separated by `;`, or by `,` when there is no `;`
fn keywords(content: &str, value: &mut Value) {
    let text = collapse_whitespace(content, true);
    let separator = if text.contains(';') { ';' } else { ',' };
    for keyword in text.split(separator).map(str::trim).filter(|k| !k.is_empty()) {
        value.push(ValueItem::Keyword(latex::decode(keyword)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_domain::Element;

    fn parse_ok(input: &str) -> File {
        let result = parse(input);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        result.file
    }

    #[test]
    fn test_parse_simple_entry() {
        let input = r#"
@article{Smith2024,
    author = {John Smith},
    title = {A Great Paper},
    year = {2024},
    journal = {Nature},
}
"#;
        let file = parse_ok(input);
        assert_eq!(file.len(), 1);

        let entry = file.entry("Smith2024").unwrap();
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.text("author").as_deref(), Some("John Smith"));
        assert_eq!(entry.text("title").as_deref(), Some("A Great Paper"));
        assert_eq!(entry.text("year").as_deref(), Some("2024"));
        assert_eq!(entry.text("journal").as_deref(), Some("Nature"));
    }

    #[test]
    fn test_parse_quoted_values() {
        let input = r#"
@article{Test2024,
    author = "Jane Doe",
    title = "Testing {"}Quotes{"}",
}
"#;
        let file = parse_ok(input);
        let entry = file.entry("Test2024").unwrap();
        assert_eq!(entry.text("author").as_deref(), Some("Jane Doe"));
        assert_eq!(entry.text("title").as_deref(), Some(r#"Testing {"}Quotes{"}"#));
        assert_eq!(file.properties.string_delimiter, Some(StringDelimiter::Quotes));
    }

    #[test]
    fn test_parse_nested_braces() {
        let file = parse_ok("@article{Test2024,\n    title = {A {B}ook about {LaTeX}},\n}");
        assert_eq!(
            file.entry("Test2024").unwrap().text("title").as_deref(),
            Some("A {B}ook about {LaTeX}")
        );
    }

    #[test]
    fn test_parse_macros_and_concatenation() {
        let input = r#"
@string{nature = "Nature"}
@article{Test2024,
    journal = nature,
    note = "See " # jan # { issue},
    month = feb,
}
"#;
        let file = parse_ok(input);
        assert_eq!(file.len(), 2);
        assert_eq!(file.macro_value("nature"), Some(&Value::plain("Nature")));

        let entry = file.entry("Test2024").unwrap();
        assert_eq!(entry.value("journal"), Some(&Value::macro_key("nature")));
        assert_eq!(
            entry.value("note").unwrap().items(),
            &[
                ValueItem::PlainText("See ".to_string()),
                ValueItem::MacroKey("jan".to_string()),
                ValueItem::PlainText(" issue".to_string()),
            ]
        );
        assert_eq!(entry.value("month"), Some(&Value::macro_key("feb")));
    }

    #[test]
    fn test_parse_forward_macro_reference() {
        let file = parse_ok("@article{a, journal = jn}\n@string{jn = {J. Nonsense}}");
        let journal = file.entry("a").unwrap().value("journal").unwrap();
        assert_eq!(file.expand_macros(journal).text(), "J. Nonsense");
    }

    #[test]
    fn test_parse_persons() {
        let file = parse_ok(
            "@book{b, author = {Smith, John and de la Fontaine, Jean and M{\\\"u}ller, J{\\\"o}rg}}",
        );
        let entry = file.entry("b").unwrap();
        let persons: Vec<&Person> = entry.value("author").unwrap().persons().collect();
        assert_eq!(persons.len(), 3);
        assert_eq!(persons[1].last_name, "de la Fontaine");
        assert_eq!(persons[2].last_name, "Müller");
        assert_eq!(persons[2].first_name.as_deref(), Some("Jörg"));
        assert_eq!(file.properties.name_formatting, Some(PersonNameFormat::LastFirst));
    }

    #[test]
    fn test_parse_keywords() {
        let file = parse_ok("@misc{k, keywords = {alpha; beta gamma;delta}}\n@misc{l, keywords = {x, y}}");
        let k = file.entry("k").unwrap().value("keywords").unwrap();
        assert_eq!(k.len(), 3);
        assert_eq!(k.text(), "alpha; beta gamma; delta");
        assert_eq!(file.entry("l").unwrap().value("keywords").unwrap().len(), 2);
    }

    #[test]
    fn test_verbatim_fields_are_not_decoded() {
        let file = parse_ok(r"@misc{u, url = {http://x.org/a\_b%20c}, note = {a\_b}}");
        let entry = file.entry("u").unwrap();
        assert_eq!(
            entry.value("url"),
            Some(&Value::verbatim(r"http://x.org/a\_b%20c"))
        );
        assert_eq!(entry.text("note").as_deref(), Some("a_b"));
    }

    #[test]
    fn test_title_protection_is_stripped_and_counted() {
        let file = parse_ok("@article{a, title = {{DNA Repair}}}\n@article{b, title = {{RNA}}}");
        assert_eq!(file.entry("a").unwrap().text("title").as_deref(), Some("DNA Repair"));
        assert_eq!(file.properties.protect_casing, Some(true));

        let file = parse_ok("@article{a, title = {DNA Repair}}");
        assert_eq!(file.properties.protect_casing, Some(false));
    }

    #[test]
    fn test_comments() {
        let input = "% Generated file\n% second line\n\n@comment{jabref-meta: x}\n@misc{a}\nfree text\n";
        let file = parse_ok(input);
        assert_eq!(file.len(), 4);
        assert_eq!(
            file.elements[0],
            Element::Comment(Comment::new("Generated file\nsecond line", false))
        );
        assert_eq!(
            file.elements[1],
            Element::Comment(Comment::new("jabref-meta: x", true))
        );
        assert_eq!(
            file.elements[3],
            Element::Comment(Comment::new("free text", false))
        );
    }

    #[test]
    fn test_encoding_comment_sets_property() {
        let file = parse_ok("@comment{x-kbibtex-encoding=utf-8}\n\n@misc{a, title = {Ä}}");
        assert_eq!(file.properties.encoding.as_deref(), Some("utf-8"));
        assert_eq!(file.len(), 1);
    }

    #[test]
    fn test_parenthesized_records_and_values() {
        let file = parse_ok("@article(p, title = (Round (about) it), year = 1999)");
        let entry = file.entry("p").unwrap();
        assert_eq!(entry.text("title").as_deref(), Some("Round (about) it"));
        assert_eq!(entry.text("year").as_deref(), Some("1999"));
    }

    #[test]
    fn test_preamble() {
        let file = parse_ok(r#"@preamble{ "\newcommand{\noop}[1]{}" # mac }"#);
        let Element::Preamble(preamble) = &file.elements[0] else {
            panic!("expected preamble");
        };
        assert_eq!(
            preamble.value.items(),
            &[
                ValueItem::VerbatimText(r"\newcommand{\noop}[1]{}".to_string()),
                ValueItem::MacroKey("mac".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_entry_body() {
        let file = parse_ok("@misc{empty,}\n@misc{bare}");
        assert!(file.entry("empty").unwrap().fields.is_empty());
        assert!(file.entry("bare").unwrap().fields.is_empty());
    }

    #[test]
    fn test_missing_id() {
        let result = parse("@article{title = {No Id}}\n@book{, year = 2000}");
        let ids: Vec<&str> = result.file.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["missing-id-1", "missing-id-2"]);
        assert_eq!(
            result.file.entry("missing-id-1").unwrap().text("title").as_deref(),
            Some("No Id")
        );
        assert!(result
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::MissingId));
    }

    #[test]
    fn test_unterminated_value_recovers_at_next_record() {
        let input = "@article{a,\n  title = {Broken\n  year = 2000,\n@book{b, title = {Fine}}\n";
        let result = parse(input);

        let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::UnterminatedValue, WarningKind::UnterminatedRecord]
        );
        assert_eq!(result.warnings[0].line, 2);
        assert_eq!(result.warnings[0].column, 11);

        let file = result.file;
        assert_eq!(file.entries().count(), 2);
        assert_eq!(file.entry("a").unwrap().text("title").as_deref(), Some("Broken year = 2000,"));
        assert_eq!(file.entry("b").unwrap().text("title").as_deref(), Some("Fine"));
    }

    #[test]
    fn test_duplicates_are_kept_with_warnings() {
        let input = "@string{j = {A}}\n@string{j = {B}}\n@misc{x, note = {1}, Note = {2}}\n@misc{x}";
        let result = parse(input);

        let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WarningKind::DuplicateKey,
                WarningKind::DuplicateField,
                WarningKind::DuplicateKey
            ]
        );
        assert_eq!(result.file.macro_value("j"), Some(&Value::plain("B")));
        assert_eq!(result.file.len(), 4);
        assert_eq!(result.file.duplicate_keys(), vec!["j", "x"]);
    }

    #[test]
    fn test_missing_assignment_and_stray_characters() {
        let result = parse("@misc{a, title {x}, year = 2001, ~ }");
        let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::MissingAssignment, WarningKind::UnexpectedCharacter]
        );
        assert_eq!(result.file.entry("a").unwrap().text("year").as_deref(), Some("2001"));
    }

    #[test]
    fn test_keyword_casing_statistics() {
        let file = parse_ok("@InProceedings{a, BookTitle = {B}, Title = {T}}\n@Article{b, Title = {T}}");
        assert_eq!(file.properties.keyword_casing, Some(KeywordCasing::UpperCamelCase));

        let file = parse_ok("@ARTICLE{a, TITLE = {T}}");
        assert_eq!(file.properties.keyword_casing, Some(KeywordCasing::UpperCase));
    }

    #[test]
    fn test_sorted_statistics() {
        assert_eq!(
            parse_ok("@misc{a}\n@misc{b}").properties.sorted_by_identifier,
            Some(true)
        );
        assert_eq!(
            parse_ok("@misc{b}\n@misc{a}").properties.sorted_by_identifier,
            Some(false)
        );
        assert_eq!(parse_ok("@misc{a}").properties.sorted_by_identifier, None);
    }

    #[test]
    fn test_ids_differing_in_case_are_distinct() {
        let result = parse("@misc{abc}\n@misc{ABC}\n");
        assert!(result
            .warnings
            .iter()
            .all(|w| w.kind != WarningKind::DuplicateKey));
        assert!(result.file.duplicate_keys().is_empty());
        assert_eq!(result.file.len(), 2);

        let result = parse("@misc{abc}\n@misc{abc}\n");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::DuplicateKey);
    }

    #[test]
    fn test_email_address_is_not_a_record() {
        let file = parse_ok("Contact: someone@example.org\n@misc{a}");
        assert_eq!(
            file.elements[0],
            Element::Comment(Comment::new("Contact: someone@example.org", false))
        );
    }

    #[test]
    fn test_helpers() {
        assert!(is_protected("{DNA}"));
        assert!(!is_protected("{DNA} and {RNA}"));
        assert!(!is_protected("DNA"));
        assert_eq!(collapse_whitespace("  a \n\t b  ", true), "a b");
        assert_eq!(collapse_whitespace("  a \n\t b  ", false), " a b ");
        assert!(contains_record_start("text @misc{x}"));
        assert!(!contains_record_start("mail a@b.org"));
    }
}
