//! BibTeX formatting module
//!
//! Converts a [`File`] back to BibTeX text. Output is deterministic and
//! reads back to the same elements.

use biblio_domain::description::format_keyword;
use biblio_domain::{
    fields, is_latex_encoding, BibTeXStyle, Comment, Element, Entry, File, Macro, Person,
    Preamble, QuoteComment, StringDelimiter, TypeFlag, Value, ValueItem,
};

use crate::latex::{self, Charset};
use crate::names;
use crate::options::SerializerOptions;
use crate::parser::{contains_record_start, find_close, is_percent_block, is_protected, ENCODING_COMMENT};

/// Format a file with explicit options and field descriptions
pub fn format_file(file: &File, options: &SerializerOptions, style: &BibTeXStyle) -> String {
    Formatter::new(options, style).format_file(file)
}

/// Format a file the way it was read: options come from its properties
pub fn format_file_default(file: &File) -> String {
    let options = SerializerOptions::for_file(file);
    format_file(file, &options, &BibTeXStyle::builtin())
}

/// Format a single element, without a trailing newline
pub fn format_element(element: &Element, options: &SerializerOptions, style: &BibTeXStyle) -> String {
    Formatter::new(options, style).format_element(element)
}

/// Writer state shared by all elements of one file
pub struct Formatter<'a> {
    options: &'a SerializerOptions,
    style: &'a BibTeXStyle,
    charset: Charset,
}

impl<'a> Formatter<'a> {
    pub fn new(options: &'a SerializerOptions, style: &'a BibTeXStyle) -> Self {
        Self {
            options,
            style,
            charset: options.charset(),
        }
    }

    pub fn format_file(&self, file: &File) -> String {
        let mut blocks = Vec::with_capacity(file.len() + 1);
        if !is_latex_encoding(&self.options.encoding) {
            blocks.push(format!(
                "@{}{{{}{}}}",
                self.command("comment"),
                ENCODING_COMMENT,
                self.options.encoding
            ));
        }
        blocks.extend(file.iter().map(|element| self.format_element(element)));

        let mut result = blocks.join("\n\n");
        if !result.is_empty() {
            result.push('\n');
        }
        result
    }

    pub fn format_element(&self, element: &Element) -> String {
        match element {
            Element::Entry(entry) => self.format_entry(entry),
            Element::Macro(macro_) => self.format_macro(macro_),
            Element::Comment(comment) => self.format_comment(comment),
            Element::Preamble(preamble) => self.format_preamble(preamble),
        }
    }

    fn format_entry(&self, entry: &Entry) -> String {
        let casing = self.options.keyword_casing;
        let mut result = String::new();

        // Entry type and id
        result.push('@');
        result.push_str(&self.style.format_entry_type(&entry.entry_type, casing));
        result.push('{');
        result.push_str(&entry.id);
        result.push(',');
        result.push('\n');

        // Fields
        for (name, value) in entry.fields.iter() {
            result.push_str("    ");
            result.push_str(&self.style.format_field(name, casing));
            result.push_str(" = ");
            result.push_str(&self.format_value(name, value, self.style.type_flag(name)));
            result.push(',');
            result.push('\n');
        }

        result.push('}');
        result
    }

    fn format_macro(&self, macro_: &Macro) -> String {
        format!(
            "@{}{{{} = {}}}",
            self.command("string"),
            macro_.key,
            self.format_value("", &macro_.value, TypeFlag::PlainText)
        )
    }

    fn format_preamble(&self, preamble: &Preamble) -> String {
        format!(
            "@{}{{{}}}",
            self.command("preamble"),
            self.format_value("", &preamble.value, TypeFlag::Source)
        )
    }

    fn format_comment(&self, comment: &Comment) -> String {
        let text = &comment.text;
        let quoting = self.options.quote_comment;

        if comment.use_command || quoting == QuoteComment::Command || contains_record_start(text) {
            return format!("@{}{{{}}}", self.command("comment"), text);
        }
        if quoting == QuoteComment::PercentSign || is_percent_block(text) {
            return text
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "%".to_string()
                    } else {
                        format!("% {}", line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
        }
        text.clone()
    }

    /// `comment`, `string` or `preamble` in the configured casing
    fn command(&self, word: &str) -> String {
        let mut canonical = word.to_string();
        canonical[..1].make_ascii_uppercase();
        format_keyword(word, Some(&canonical), self.options.keyword_casing)
    }

    /// Format a field value.
    ///
    /// Runs of persons and runs of keywords share one delimited group; all
    /// other items are joined with `#`.
    fn format_value(&self, name: &str, value: &Value, flag: TypeFlag) -> String {
        let items = value.items();
        match items {
            [] => return self.delimit(""),
            [ValueItem::PlainText(text)] if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) => {
                return text.clone();
            }
            _ => {}
        }

        let mut pieces = Vec::new();
        let mut i = 0;
        while i < items.len() {
            match &items[i] {
                ValueItem::Person(_) => {
                    let run: Vec<String> = items[i..]
                        .iter()
                        .map_while(|item| match item {
                            ValueItem::Person(person) => Some(self.format_person(person)),
                            _ => None,
                        })
                        .collect();
                    i += run.len();
                    pieces.push(self.delimit(&run.join(" and ")));
                }
                ValueItem::Keyword(_) => {
                    let run: Vec<String> = items[i..]
                        .iter()
                        .map_while(|item| match item {
                            ValueItem::Keyword(keyword) => Some(self.encode(keyword, flag)),
                            _ => None,
                        })
                        .collect();
                    i += run.len();
                    pieces.push(self.delimit(&run.join("; ")));
                }
                ValueItem::MacroKey(key) => {
                    pieces.push(key.clone());
                    i += 1;
                }
                ValueItem::VerbatimText(text) => {
                    pieces.push(self.delimit(text));
                    i += 1;
                }
                ValueItem::PlainText(text) => {
                    let mut text = self.encode(text, flag);
                    if items.len() == 1
                        && fields::is_title_like(name)
                        && (self.options.protect_casing || is_protected(&text))
                    {
                        text = format!("{{{}}}", text);
                    }
                    pieces.push(self.delimit(&text));
                    i += 1;
                }
            }
        }

        pieces.join(" # ")
    }

    fn encode(&self, text: &str, flag: TypeFlag) -> String {
        if flag.is_raw() {
            text.to_string()
        } else {
            latex::encode(text, self.charset)
        }
    }

    fn format_person(&self, person: &Person) -> String {
        let mut encoded = Person::new(latex::encode(&person.last_name, self.charset));
        if let Some(first) = &person.first_name {
            encoded = encoded.with_first_name(latex::encode(first, self.charset));
        }
        if let Some(suffix) = &person.suffix {
            encoded = encoded.with_suffix(latex::encode(suffix, self.charset));
        }
        names::format_person(&encoded, self.options.name_formatting)
    }

    /// Wrap text in the configured delimiters, or in braces when the text
    /// would end the group early
    fn delimit(&self, text: &str) -> String {
        let delimiter = match self.options.string_delimiter {
            StringDelimiter::Braces => StringDelimiter::Braces,
            other => {
                let close = other.close();
                let probe = format!("{}{}", text, close);
                if find_close(&probe, close as u8) == Some(text.len()) {
                    other
                } else {
                    StringDelimiter::Braces
                }
            }
        };
        format!("{}{}{}", delimiter.open(), text, delimiter.close())
    }
}
