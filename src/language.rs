//! Supported target languages.
//!
//! A static registry is the single source of truth for language metadata.
//! `Language` values are validated against it on construction, so a
//! `Language` in hand is always a supported one.

use anyhow::{bail, Result};
use std::fmt;

/// Metadata for one supported language.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LanguageInfo {
    /// ISO 639-1 code (e.g. "en", "fr")
    pub code: &'static str,
    /// English name, used in translation prompts
    pub name: &'static str,
    /// Native name
    pub native_name: &'static str,
    /// Whether this is the source language extracted strings are written in
    pub is_source: bool,
}

/// All languages the pipeline knows how to target.
static REGISTRY: &[LanguageInfo] = &[
    LanguageInfo {
        code: "en",
        name: "English",
        native_name: "English",
        is_source: true,
    },
    LanguageInfo {
        code: "ar",
        name: "Arabic",
        native_name: "العربية",
        is_source: false,
    },
    LanguageInfo {
        code: "fr",
        name: "French",
        native_name: "Français",
        is_source: false,
    },
    LanguageInfo {
        code: "es",
        name: "Spanish",
        native_name: "Español",
        is_source: false,
    },
    LanguageInfo {
        code: "de",
        name: "German",
        native_name: "Deutsch",
        is_source: false,
    },
    LanguageInfo {
        code: "pt",
        name: "Portuguese",
        native_name: "Português",
        is_source: false,
    },
    LanguageInfo {
        code: "it",
        name: "Italian",
        native_name: "Italiano",
        is_source: false,
    },
    LanguageInfo {
        code: "ja",
        name: "Japanese",
        native_name: "日本語",
        is_source: false,
    },
    LanguageInfo {
        code: "zh",
        name: "Chinese",
        native_name: "中文",
        is_source: false,
    },
    LanguageInfo {
        code: "tr",
        name: "Turkish",
        native_name: "Türkçe",
        is_source: false,
    },
];

/// A validated language.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    info: &'static LanguageInfo,
}

impl Language {
    /// Create a Language from an ISO 639-1 code, validating it against
    /// the registry.
    pub fn from_code(code: &str) -> Result<Language> {
        match REGISTRY.iter().find(|info| info.code == code) {
            Some(info) => Ok(Language { info }),
            None => bail!("unsupported language code: '{}'", code),
        }
    }

    /// The source language extracted strings are written in.
    pub fn source() -> Language {
        let info = REGISTRY
            .iter()
            .find(|info| info.is_source)
            .expect("registry defines a source language");
        Language { info }
    }

    pub fn code(&self) -> &'static str {
        self.info.code
    }

    /// English name, as used in translation prompts.
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn native_name(&self) -> &'static str {
        self.info.native_name
    }

    pub fn is_source(&self) -> bool {
        self.info.is_source
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.info.code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info.code)
    }
}
