//! Serializer options

use biblio_domain::{
    File, FileProperties, KeywordCasing, PersonNameFormat, QuoteComment, StringDelimiter,
    LATEX_ENCODING,
};
use serde::{Deserialize, Serialize};

use crate::latex::Charset;

/// How a file is written.
///
/// Accepts kebab-case, snake_case and camelCase keys when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SerializerOptions {
    /// "LaTeX" or a charset name such as "UTF-8" or "ISO-8859-1"
    pub encoding: String,
    #[serde(alias = "string_delimiter", alias = "stringDelimiter")]
    pub string_delimiter: StringDelimiter,
    #[serde(alias = "quote_comment", alias = "quoteComment")]
    pub quote_comment: QuoteComment,
    #[serde(alias = "keyword_casing", alias = "keywordCasing")]
    pub keyword_casing: KeywordCasing,
    /// Wrap titles in an extra brace pair
    #[serde(alias = "protect_casing", alias = "protectCasing")]
    pub protect_casing: bool,
    #[serde(alias = "name_formatting", alias = "nameFormatting")]
    pub name_formatting: PersonNameFormat,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            encoding: LATEX_ENCODING.to_string(),
            string_delimiter: StringDelimiter::Braces,
            quote_comment: QuoteComment::None,
            keyword_casing: KeywordCasing::LowerCase,
            protect_casing: true,
            name_formatting: PersonNameFormat::LastFirst,
        }
    }
}

impl SerializerOptions {
    /// Defaults overlaid with what is known about `file`
    pub fn for_file(file: &File) -> Self {
        Self::default().overlay(&file.properties)
    }

    /// Replace every option the properties know
    pub fn overlay(mut self, properties: &FileProperties) -> Self {
        if let Some(encoding) = &properties.encoding {
            self.encoding = encoding.clone();
        }
        if let Some(delimiter) = properties.string_delimiter {
            self.string_delimiter = delimiter;
        }
        if let Some(quote_comment) = properties.quote_comment {
            self.quote_comment = quote_comment;
        }
        if let Some(casing) = properties.keyword_casing {
            self.keyword_casing = casing;
        }
        if let Some(protect) = properties.protect_casing {
            self.protect_casing = protect;
        }
        if let Some(format) = properties.name_formatting {
            self.name_formatting = format;
        }
        self
    }

    /// Characters that can be written without LaTeX commands
    pub fn charset(&self) -> Charset {
        crate::codec::charset_for(&self.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SerializerOptions::default();
        assert_eq!(options.encoding, "LaTeX");
        assert!(options.protect_casing);
        assert_eq!(options.charset(), Charset::Ascii);
    }

    #[test]
    fn test_overlay_file_properties() {
        let mut file = File::new();
        file.properties.encoding = Some("UTF-8".to_string());
        file.properties.string_delimiter = Some(StringDelimiter::Quotes);
        file.properties.protect_casing = Some(false);

        let options = SerializerOptions::for_file(&file);
        assert_eq!(options.encoding, "UTF-8");
        assert_eq!(options.charset(), Charset::Unicode);
        assert_eq!(options.string_delimiter, StringDelimiter::Quotes);
        assert!(!options.protect_casing);
        assert_eq!(options.keyword_casing, KeywordCasing::LowerCase);
    }

    #[test]
    fn test_deserialize_key_styles() {
        let options: SerializerOptions = toml::from_str(
            r#"
encoding = "ISO-8859-1"
string-delimiter = '""'
keywordCasing = "UpperCamelCase"
protect_casing = false
"#,
        )
        .unwrap();
        assert_eq!(options.charset(), Charset::Latin1);
        assert_eq!(options.string_delimiter, StringDelimiter::Quotes);
        assert_eq!(options.keyword_casing, KeywordCasing::UpperCamelCase);
        assert!(!options.protect_casing);
        assert_eq!(options.name_formatting, PersonNameFormat::LastFirst);
    }
}
