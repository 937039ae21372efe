//! Byte-level reading and writing of BibTeX files
//!
//! The parser and formatter work on text. This module converts raw bytes in
//! the supported charsets (UTF-8, ISO-8859-1, US-ASCII) to and from text.

use biblio_domain::{BibTeXStyle, File};
use tracing::debug;

use crate::error::{BibTeXError, Result};
use crate::formatter::format_file;
use crate::latex::Charset;
use crate::options::SerializerOptions;
use crate::parser::{parse_with_style, BibTeXParseResult};

/// Canonical name written for Latin-1 files
pub const LATIN1: &str = "ISO-8859-1";

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Which characters an encoding name can hold as plain text.
///
/// Unknown names are treated as Unicode charsets.
pub fn charset_for(encoding: &str) -> Charset {
    match normalize(encoding).as_str() {
        "latex" | "ascii" | "usascii" => Charset::Ascii,
        "iso88591" | "latin1" | "l1" => Charset::Latin1,
        _ => Charset::Unicode,
    }
}

/// Byte representation of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEncoding {
    Utf8,
    Latin1,
    Ascii,
}

impl ByteEncoding {
    /// Byte encoding for an encoding name; LaTeX output is stored as UTF-8
    pub fn for_name(encoding: &str) -> Result<Self> {
        match normalize(encoding).as_str() {
            "latex" | "utf8" => Ok(ByteEncoding::Utf8),
            "ascii" | "usascii" => Ok(ByteEncoding::Ascii),
            "iso88591" | "latin1" | "l1" => Ok(ByteEncoding::Latin1),
            _ => Err(BibTeXError::UnsupportedEncoding(encoding.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ByteEncoding::Utf8 => "UTF-8",
            ByteEncoding::Latin1 => LATIN1,
            ByteEncoding::Ascii => "US-ASCII",
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        let limit = match self {
            ByteEncoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            ByteEncoding::Latin1 => 0xFF,
            ByteEncoding::Ascii => 0x7F,
        };

        text.chars()
            .map(|c| {
                u8::try_from(c as u32)
                    .ok()
                    .filter(|&b| u32::from(b) <= limit)
                    .ok_or_else(|| BibTeXError::Encoding {
                        character: c,
                        encoding: self.name().to_string(),
                    })
            })
            .collect()
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            ByteEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                BibTeXError::Encoding {
                    character: char::REPLACEMENT_CHARACTER,
                    encoding: format!("{} ({})", self.name(), e),
                }
            }),
            ByteEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            ByteEncoding::Ascii => match bytes.iter().find(|b| !b.is_ascii()) {
                Some(&b) => Err(BibTeXError::Encoding {
                    character: char::from(b),
                    encoding: self.name().to_string(),
                }),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }
}

/// Decode bytes as UTF-8 (a BOM is skipped), falling back to Latin-1
pub fn decode_bytes(bytes: &[u8]) -> (String, ByteEncoding) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), ByteEncoding::Utf8),
        Err(_) => (
            bytes.iter().map(|&b| char::from(b)).collect(),
            ByteEncoding::Latin1,
        ),
    }
}

/// Parse the bytes of a BibTeX file.
///
/// A declared Latin-1 encoding wins over UTF-8 detection. Files that are
/// not valid UTF-8 and declare nothing are marked as Latin-1.
pub fn load(bytes: &[u8], style: &BibTeXStyle) -> BibTeXParseResult {
    let (text, detected) = decode_bytes(bytes);
    let mut result = parse_with_style(&text, style);

    let declared = result.file.properties.encoding.clone();
    match declared {
        Some(name)
            if detected == ByteEncoding::Utf8
                && charset_for(&name) == Charset::Latin1
                && !bytes.is_ascii() =>
        {
            debug!(encoding = %name, "re-reading with declared encoding");
            let text: String = bytes.iter().map(|&b| char::from(b)).collect();
            result = parse_with_style(&text, style);
        }
        None if detected == ByteEncoding::Latin1 => {
            debug!("input is not UTF-8, reading as Latin-1");
            result.file.properties.encoding = Some(LATIN1.to_string());
        }
        _ => {}
    }

    result
}

/// Serialize a file to bytes in the options' encoding
pub fn save(file: &File, options: &SerializerOptions, style: &BibTeXStyle) -> Result<Vec<u8>> {
    let encoding = ByteEncoding::for_name(&options.encoding)?;
    encoding.encode(&format_file(file, options, style))
}
