/// Language rule data: the lookup tables behind prepositional phrases,
/// gender-adapted titles and demonym overrides.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::catalog::base_language;

/// Grammar lookup tables keyed by locale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageRules {
    #[serde(default)]
    pub locales: HashMap<String, LocaleRules>,
}

impl LanguageRules {
    /// Rules for `locale`, falling back to its base language.
    pub fn locale(&self, locale: &str) -> Option<&LocaleRules> {
        self.locales
            .get(locale)
            .or_else(|| self.locales.get(base_language(locale)))
    }

    /// Merge another rule set in. Locales from `other` replace ours.
    pub fn merge(&mut self, other: LanguageRules) {
        self.locales.extend(other.locales);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocaleRules {
    /// Preposition → forms by referent gender.
    #[serde(default)]
    pub prepositions: BTreeMap<String, PrepositionRule>,
    /// Title → gender → adapted title.
    #[serde(default)]
    pub gender_titles: BTreeMap<String, BTreeMap<String, String>>,
    /// Appended to titles for feminine referents when no explicit form exists.
    #[serde(default)]
    pub feminine_suffix: Option<String>,
    /// Replaces the built-in demonym table for this locale.
    #[serde(default)]
    pub demonyms: Option<SuffixTable>,
}

impl LocaleRules {
    /// The adapted form of `title` for `gender`, if the table has one.
    pub fn gendered_title(&self, title: &str, gender: &str) -> Option<&str> {
        let forms = self.gender_titles.get(title)?;
        forms
            .iter()
            .find(|(key, _)| normalize_gender(key) == gender)
            .map(|(_, form)| form.as_str())
    }
}

/// Surface forms of one preposition, e.g. German `in` → `im` / `in der`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrepositionRule {
    #[serde(default)]
    pub forms: BTreeMap<String, String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl PrepositionRule {
    pub fn form(&self, gender: Option<&str>) -> Option<&str> {
        if let Some(gender) = gender {
            let found = self
                .forms
                .iter()
                .find(|(key, _)| normalize_gender(key) == gender)
                .map(|(_, form)| form.as_str());
            if found.is_some() {
                return found;
            }
        }
        self.default.as_deref()
    }
}

/// One suffix rewrite: a word ending in `suffix` has it replaced by `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    pub suffix: String,
    pub replacement: String,
}

/// Ordered suffix rules (first match wins) plus the suffix appended when
/// nothing matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixTable {
    pub rules: Vec<SuffixRule>,
    pub default_suffix: String,
}

/// Canonical gender key: `"m"`, `"f"`, `"n"`, or the lower-cased input.
pub fn normalize_gender(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "m" | "masc" | "male" | "masculine" | "männlich" | "maskulin" => "m".to_string(),
        "f" | "w" | "fem" | "female" | "feminine" | "weiblich" | "feminin" => "f".to_string(),
        "n" | "neut" | "neuter" | "neutral" | "sächlich" | "neutrum" => "n".to_string(),
        _ => lower,
    }
}
