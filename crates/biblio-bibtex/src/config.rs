//! Configuration file
//!
//! ```toml
//! [output]
//! encoding = "UTF-8"
//! string-delimiter = "{}"
//! keyword-casing = "lowercase"
//!
//! [style]
//! path = "/path/to/fields.toml"
//! ```
//!
//! Loaded from `--config` or `<config dir>/biblio/config.toml`. A missing
//! file means defaults.

use std::path::{Path, PathBuf};

use biblio_domain::BibTeXStyle;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::options::SerializerOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// TOML or JSON file replacing the built-in field descriptions
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options used when a file does not say how it was written
    pub output: SerializerOptions,
    pub style: StyleConfig,
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// `<config dir>/biblio/config.toml`
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("biblio").join("config.toml"))
    }

    /// Load from `path`, or from the user location when `path` is `None`.
    ///
    /// An explicit path must exist; a missing user file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::user_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        debug!(path = %path.display(), "loading configuration");
        Self::from_toml(&std::fs::read_to_string(&path)?)
    }

    /// The configured style, or the built-in one
    pub fn style(&self) -> Result<BibTeXStyle> {
        let Some(path) = &self.style.path else {
            return Ok(BibTeXStyle::builtin());
        };

        let source = std::fs::read_to_string(path)?;
        let style = if path.extension().is_some_and(|ext| ext == "json") {
            BibTeXStyle::from_json(&source)?
        } else {
            BibTeXStyle::from_toml(&source)?
        };
        Ok(style)
    }

    /// Options for writing `file`: configured defaults overlaid with what
    /// the file's properties know
    pub fn options_for(&self, file: &biblio_domain::File) -> SerializerOptions {
        self.output.clone().overlay(&file.properties)
    }
}
