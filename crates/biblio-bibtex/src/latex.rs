//! LaTeX character codec
//!
//! Decodes LaTeX accent commands, special letters and escaped specials to
//! Unicode when reading, and encodes them back when writing. Only
//! constructs with an exact inverse are handled, so decoding followed by
//! encoding is stable. Other commands (`\emph`, dashes) are left alone, and
//! math and `\url`-style arguments are never touched.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Which characters survive unencoded on output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// 7-bit output: every known non-ASCII character becomes a command
    Ascii,
    /// ISO-8859-1: only characters above U+00FF become commands
    Latin1,
    /// Unicode passes through
    Unicode,
}

impl Charset {
    fn represents(self, c: char) -> bool {
        match self {
            Charset::Ascii => c.is_ascii(),
            Charset::Latin1 => (c as u32) <= 0xFF,
            Charset::Unicode => true,
        }
    }
}

/// Characters that must be backslash-escaped in BibTeX text
const SPECIALS: [char; 4] = ['&', '%', '_', '#'];

// ===== Tables =====

lazy_static! {
    /// (command, base letter, character) for accents written with a symbol
    static ref SYMBOL_ACCENTS: Vec<(char, char, char)> = vec![
        // Umlaut (diaeresis)
        ('"', 'a', 'ä'), ('"', 'A', 'Ä'), ('"', 'e', 'ë'), ('"', 'E', 'Ë'),
        ('"', 'i', 'ï'), ('"', 'I', 'Ï'), ('"', 'o', 'ö'), ('"', 'O', 'Ö'),
        ('"', 'u', 'ü'), ('"', 'U', 'Ü'), ('"', 'y', 'ÿ'), ('"', 'Y', 'Ÿ'),

        // Acute accent
        ('\'', 'a', 'á'), ('\'', 'A', 'Á'), ('\'', 'e', 'é'), ('\'', 'E', 'É'),
        ('\'', 'i', 'í'), ('\'', 'I', 'Í'), ('\'', 'o', 'ó'), ('\'', 'O', 'Ó'),
        ('\'', 'u', 'ú'), ('\'', 'U', 'Ú'), ('\'', 'y', 'ý'), ('\'', 'Y', 'Ý'),
        ('\'', 'c', 'ć'), ('\'', 'C', 'Ć'), ('\'', 'n', 'ń'), ('\'', 'N', 'Ń'),
        ('\'', 's', 'ś'), ('\'', 'S', 'Ś'), ('\'', 'z', 'ź'), ('\'', 'Z', 'Ź'),

        // Grave accent
        ('`', 'a', 'à'), ('`', 'A', 'À'), ('`', 'e', 'è'), ('`', 'E', 'È'),
        ('`', 'i', 'ì'), ('`', 'I', 'Ì'), ('`', 'o', 'ò'), ('`', 'O', 'Ò'),
        ('`', 'u', 'ù'), ('`', 'U', 'Ù'),

        // Circumflex
        ('^', 'a', 'â'), ('^', 'A', 'Â'), ('^', 'e', 'ê'), ('^', 'E', 'Ê'),
        ('^', 'i', 'î'), ('^', 'I', 'Î'), ('^', 'o', 'ô'), ('^', 'O', 'Ô'),
        ('^', 'u', 'û'), ('^', 'U', 'Û'),

        // Tilde
        ('~', 'a', 'ã'), ('~', 'A', 'Ã'), ('~', 'n', 'ñ'), ('~', 'N', 'Ñ'),
        ('~', 'o', 'õ'), ('~', 'O', 'Õ'),

        // Macron
        ('=', 'a', 'ā'), ('=', 'A', 'Ā'), ('=', 'e', 'ē'), ('=', 'E', 'Ē'),
        ('=', 'i', 'ī'), ('=', 'I', 'Ī'), ('=', 'o', 'ō'), ('=', 'O', 'Ō'),
        ('=', 'u', 'ū'), ('=', 'U', 'Ū'),

        // Dot above
        ('.', 'z', 'ż'), ('.', 'Z', 'Ż'), ('.', 'e', 'ė'), ('.', 'E', 'Ė'),
    ];

    /// (command, base letter, character) for accents written with a letter
    static ref LETTER_ACCENTS: Vec<(char, char, char)> = vec![
        // Cedilla
        ('c', 'c', 'ç'), ('c', 'C', 'Ç'), ('c', 's', 'ş'), ('c', 'S', 'Ş'),
        // Caron
        ('v', 'c', 'č'), ('v', 'C', 'Č'), ('v', 's', 'š'), ('v', 'S', 'Š'),
        ('v', 'z', 'ž'), ('v', 'Z', 'Ž'), ('v', 'r', 'ř'), ('v', 'R', 'Ř'),
        ('v', 'e', 'ě'), ('v', 'E', 'Ě'), ('v', 'n', 'ň'), ('v', 'N', 'Ň'),
        // Breve
        ('u', 'a', 'ă'), ('u', 'A', 'Ă'), ('u', 'g', 'ğ'), ('u', 'G', 'Ğ'),
        // Ogonek
        ('k', 'a', 'ą'), ('k', 'A', 'Ą'), ('k', 'e', 'ę'), ('k', 'E', 'Ę'),
        // Ring
        ('r', 'a', 'å'), ('r', 'A', 'Å'), ('r', 'u', 'ů'), ('r', 'U', 'Ů'),
        // Double acute
        ('H', 'o', 'ő'), ('H', 'O', 'Ő'), ('H', 'u', 'ű'), ('H', 'U', 'Ű'),
    ];

    /// Letters written as a control word, e.g. `\ss`
    static ref SPECIAL_LETTERS: Vec<(&'static str, char)> = vec![
        ("ss", 'ß'),
        ("ae", 'æ'), ("AE", 'Æ'),
        ("oe", 'œ'), ("OE", 'Œ'),
        ("aa", 'å'), ("AA", 'Å'),
        ("o", 'ø'), ("O", 'Ø'),
        ("l", 'ł'), ("L", 'Ł'),
        ("i", 'ı'), ("j", 'ȷ'),
    ];

    static ref DECODE_ACCENT: HashMap<(char, char), char> = SYMBOL_ACCENTS
        .iter()
        .chain(LETTER_ACCENTS.iter())
        .map(|&(command, base, c)| ((command, base), c))
        .collect();

    static ref DECODE_LETTER: HashMap<&'static str, char> =
        SPECIAL_LETTERS.iter().copied().collect();

    /// Character → LaTeX form; special letters take precedence over accents
    static ref ENCODE: HashMap<char, String> = {
        let mut map = HashMap::new();
        for &(name, c) in SPECIAL_LETTERS.iter() {
            map.entry(c).or_insert_with(|| format!("{{\\{}}}", name));
        }
        for &(command, base, c) in SYMBOL_ACCENTS.iter() {
            map.entry(c).or_insert_with(|| format!("{{\\{}{}}}", command, base));
        }
        for &(command, base, c) in LETTER_ACCENTS.iter() {
            map.entry(c).or_insert_with(|| format!("{{\\{}{{{}}}}}", command, base));
        }
        map
    };
}

// ===== Patterns =====

lazy_static! {
    static ref SYMBOL_ACCENT_BRACED: Regex =
        Regex::new(r#"\{\\(["'`^~=.])(?:\{(\\[ij]|[A-Za-z])\}|(\\[ij]\b|[A-Za-z]))\}"#).unwrap();
    static ref SYMBOL_ACCENT: Regex =
        Regex::new(r#"\\(["'`^~=.])(?:\{(\\[ij]|[A-Za-z])\}|(\\[ij]\b|[A-Za-z]))"#).unwrap();
    static ref LETTER_ACCENT_BRACED: Regex =
        Regex::new(r"\{\\([cvukrH])(?:\{(\\[ij]|[A-Za-z])\}|\s+(\\[ij]\b|[A-Za-z]))\}").unwrap();
    static ref LETTER_ACCENT: Regex =
        Regex::new(r"\\([cvukrH])(?:\{(\\[ij]|[A-Za-z])\}|\s+(\\[ij]\b|[A-Za-z]))").unwrap();
    static ref SPECIAL_LETTER_BRACED: Regex =
        Regex::new(r"\{\\(ss|ae|AE|oe|OE|aa|AA|o|O|l|L|i|j)\}").unwrap();
    static ref SPECIAL_LETTER: Regex =
        Regex::new(r"\\(ss|ae|AE|oe|OE|aa|AA|o|O|l|L|i|j)\b(?:\{\})?").unwrap();
    static ref ESCAPED_SPECIAL: Regex = Regex::new(r"\\([&%_#])").unwrap();
}

fn replace_accent(caps: &Captures) -> String {
    let command = caps[1].chars().next().unwrap_or_default();
    let base = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim_start_matches('\\'))
        .and_then(|b| b.chars().next())
        .unwrap_or_default();

    match DECODE_ACCENT.get(&(command, base)) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}

fn replace_letter(caps: &Captures) -> String {
    match DECODE_LETTER.get(&caps[1]) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}

/// Commands whose first argument is copied unchanged in both directions
const VERBATIM_COMMANDS: [&str; 3] = ["url", "path", "href"];

/// Byte ranges of math (`$...$`, `$$...$$`) and of verbatim command
/// arguments such as `\url{...}`. Text inside them is never decoded or
/// escaped. Unclosed math or arguments count as ordinary text.
fn verbatim_spans(input: &str) -> Vec<(usize, usize)> {
    let bytes = input.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                let name_len = input[pos + 1..]
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(input.len() - pos - 1);
                let name = &input[pos + 1..pos + 1 + name_len];
                let after = pos + 1 + name_len;
                if VERBATIM_COMMANDS.contains(&name) && bytes.get(after) == Some(&b'{') {
                    if let Some(end) = argument_end(bytes, after + 1) {
                        spans.push((pos, end));
                        pos = end;
                        continue;
                    }
                }
                // `\$` and other escapes
                pos += if name_len == 0 { 2 } else { name_len + 1 };
            }
            b'$' => {
                let display = bytes.get(pos + 1) == Some(&b'$');
                let open = if display { 2 } else { 1 };
                match math_end(bytes, pos + open, display) {
                    Some(end) => {
                        spans.push((pos, end));
                        pos = end;
                    }
                    None => pos += open,
                }
            }
            _ => pos += 1,
        }
    }

    spans
}

/// Offset just past the `}` closing a group that starts at `start`
fn argument_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i + 1),
            b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Offset just past the unescaped `$` (or `$$`) closing math opened before `start`
fn math_end(bytes: &[u8], start: usize, display: bool) -> Option<usize> {
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'$' if !display => return Some(pos + 1),
            b'$' if bytes.get(pos + 1) == Some(&b'$') => return Some(pos + 2),
            _ => pos += 1,
        }
    }
    None
}

/// Apply `convert` to the text outside verbatim spans
fn map_text(input: &str, convert: impl Fn(&str) -> String) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for (start, end) in verbatim_spans(input) {
        result.push_str(&convert(&input[last..start]));
        result.push_str(&input[start..end]);
        last = end;
    }
    result.push_str(&convert(&input[last..]));
    result
}

/// Decode LaTeX accents, special letters and escaped specials to Unicode.
///
/// Math and the arguments of `\url`, `\path` and `\href` are kept as written.
pub fn decode(input: &str) -> String {
    if !input.contains('\\') {
        return input.to_string();
    }
    map_text(input, decode_text)
}

fn decode_text(input: &str) -> String {
    if !input.contains('\\') {
        return input.to_string();
    }

    let mut result = SYMBOL_ACCENT_BRACED
        .replace_all(input, replace_accent)
        .into_owned();
    result = LETTER_ACCENT_BRACED
        .replace_all(&result, replace_accent)
        .into_owned();
    result = SYMBOL_ACCENT.replace_all(&result, replace_accent).into_owned();
    result = LETTER_ACCENT.replace_all(&result, replace_accent).into_owned();
    result = SPECIAL_LETTER_BRACED
        .replace_all(&result, replace_letter)
        .into_owned();
    result = SPECIAL_LETTER.replace_all(&result, replace_letter).into_owned();
    ESCAPED_SPECIAL.replace_all(&result, "$1").into_owned()
}

/// Encode text for a BibTeX file written in `charset`.
///
/// `& % _ #` are escaped unless already preceded by a backslash. Characters
/// the charset cannot hold are replaced by their LaTeX form when one is
/// known, and kept otherwise. Math and verbatim command arguments are
/// copied unchanged.
pub fn encode(input: &str, charset: Charset) -> String {
    map_text(input, |text| encode_text(text, charset))
}

fn encode_text(input: &str, charset: Charset) -> String {
    let mut result = String::with_capacity(input.len());
    let mut previous = None;

    for c in input.chars() {
        if SPECIALS.contains(&c) && previous != Some('\\') {
            result.push('\\');
            result.push(c);
        } else if !charset.represents(c) {
            match ENCODE.get(&c) {
                Some(latex) => result.push_str(latex),
                None => result.push(c),
            }
        } else {
            result.push(c);
        }
        previous = Some(c);
    }

    result
}
