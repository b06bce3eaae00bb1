//! Localization table.
//!
//! A `Phrasebook` is loaded once at startup and shared read-only. Templates use
//! `{name}` placeholders; numbers are pre-rendered by [`crate::format`] so they read
//! the same in every language.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedLanguageError;

const ENGLISH_TABLE: &str = include_str!("../locales/en.json");
const HINDI_TABLE: &str = include_str!("../locales/hi.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hindi];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

/// What to do with a language code the phrasebook does not cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguagePolicy {
    Strict,
    #[default]
    FallbackToEnglish,
}

impl std::str::FromStr for LanguagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(LanguagePolicy::Strict),
            "fallback" | "fallback_to_english" => Ok(LanguagePolicy::FallbackToEnglish),
            other => Err(format!("unknown language policy '{}'", other)),
        }
    }
}

/// Resolve a requested code under `policy`. The fallback is logged, never silent.
pub fn resolve_language(
    code: &str,
    policy: LanguagePolicy,
) -> Result<Language, UnsupportedLanguageError> {
    if let Some(language) = Language::from_code(code) {
        return Ok(language);
    }
    match policy {
        LanguagePolicy::Strict => Err(UnsupportedLanguageError {
            code: code.to_string(),
        }),
        LanguagePolicy::FallbackToEnglish => {
            tracing::warn!("Unsupported language '{}', falling back to English", code);
            Ok(Language::English)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Phrasebook {
    tables: HashMap<Language, HashMap<String, String>>,
}

impl Phrasebook {
    /// English and Hindi tables compiled into the binary.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json_tables(&[
            (Language::English, ENGLISH_TABLE),
            (Language::Hindi, HINDI_TABLE),
        ])
    }

    pub fn from_json_tables(tables: &[(Language, &str)]) -> Result<Self, serde_json::Error> {
        let mut parsed = HashMap::new();
        for (language, raw) in tables {
            let table: HashMap<String, String> = serde_json::from_str(raw)?;
            parsed.insert(*language, table);
        }
        Ok(Self { tables: parsed })
    }

    /// Template for `key`, falling back to English when `language` lacks it.
    pub fn template(&self, language: Language, key: &str) -> Option<&str> {
        self.lookup(language, key)
            .or_else(|| self.lookup(Language::English, key))
    }

    fn lookup(&self, language: Language, key: &str) -> Option<&str> {
        self.tables
            .get(&language)
            .and_then(|t| t.get(key))
            .map(String::as_str)
    }

    /// English keys that `language` does not translate, sorted.
    pub fn missing_keys(&self, language: Language) -> Vec<String> {
        let Some(english) = self.tables.get(&Language::English) else {
            return Vec::new();
        };
        let mut missing: Vec<String> = english
            .keys()
            .filter(|k| self.lookup(language, k).is_none())
            .cloned()
            .collect();
        missing.sort();
        missing
    }

    pub fn localizer(&self, language: Language) -> Localizer<'_> {
        Localizer {
            book: self,
            language,
        }
    }
}

/// A phrasebook bound to one language.
#[derive(Debug, Clone, Copy)]
pub struct Localizer<'a> {
    book: &'a Phrasebook,
    language: Language,
}

impl<'a> Localizer<'a> {
    pub fn has(&self, key: &str) -> bool {
        self.book.template(self.language, key).is_some()
    }

    pub fn text(&self, key: &str) -> String {
        self.render(key, &[])
    }

    /// Fill `{name}` placeholders in the template for `key`.
    ///
    /// Substitution is a single pass over the template, so braces inside argument
    /// values are copied as they are. Unknown placeholders stay literal. An unknown
    /// key renders as the key itself and is logged.
    pub fn render(&self, key: &str, args: &[(&str, String)]) -> String {
        let Some(template) = self.book.template(self.language, key) else {
            tracing::warn!("Missing phrasebook key '{}'", key);
            return key.to_string();
        };
        fill_placeholders(template, args)
    }
}

fn fill_placeholders(template: &str, args: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match args.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
