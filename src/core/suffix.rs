//! Suffix-rule tables for demonyms and genitives.

use crate::schema::lang::SuffixTable;

/// Built-in demonym rules: `(suffix, replacement)`, first match wins.
const GERMAN_DEMONYMS: &[(&str, &str)] = &[
    ("ingen", "inger"),
    ("hausen", "hausener"),
    ("stadt", "städter"),
    ("burg", "burger"),
    ("berg", "berger"),
    ("dorf", "dorfer"),
    ("heim", "heimer"),
    ("feld", "felder"),
    ("furt", "furter"),
    ("bach", "bacher"),
    ("brück", "brücker"),
    ("land", "länder"),
    ("ien", "ier"),
    ("au", "auer"),
    ("en", "ener"),
    ("a", "aner"),
];
const GERMAN_DEFAULT_SUFFIX: &str = "er";

const ENGLISH_DEMONYMS: &[(&str, &str)] = &[
    ("land", "lander"),
    ("polis", "politan"),
    ("burg", "burger"),
    ("ton", "tonian"),
    ("ica", "ican"),
    ("ia", "ian"),
    ("a", "an"),
    ("y", "ian"),
];
const ENGLISH_DEFAULT_SUFFIX: &str = "er";

/// German names ending in these take a bare apostrophe in the genitive.
const GERMAN_SIBILANT_ENDINGS: &[&str] = &["tz", "s", "ß", "x", "z"];

/// Built-in demonym rules for a base language, if any.
pub fn builtin_demonyms(language: &str) -> Option<(&'static [(&'static str, &'static str)], &'static str)> {
    match language {
        "de" => Some((GERMAN_DEMONYMS, GERMAN_DEFAULT_SUFFIX)),
        "en" => Some((ENGLISH_DEMONYMS, ENGLISH_DEFAULT_SUFFIX)),
        _ => None,
    }
}

/// Strip `suffix` from the end of `word`, comparing case-insensitively.
/// Returns the stem.
pub fn strip_suffix_ci<'w>(word: &'w str, suffix: &str) -> Option<&'w str> {
    let suffix_len = suffix.chars().count();
    let word_len = word.chars().count();
    if suffix_len == 0 || suffix_len > word_len {
        return None;
    }
    let (cut, _) = word.char_indices().nth(word_len - suffix_len)?;
    if word[cut..].to_lowercase() == suffix.to_lowercase() {
        Some(&word[..cut])
    } else {
        None
    }
}

/// Apply ordered suffix rules to `word`. Without a match, a trailing `e`
/// is dropped and `default_suffix` appended. A rule never consumes the
/// whole word, and single-letter words are returned unchanged.
pub fn apply_rules<'r, I>(word: &str, rules: I, default_suffix: &str) -> String
where
    I: IntoIterator<Item = (&'r str, &'r str)>,
{
    if word.chars().nth(1).is_none() {
        return word.to_string();
    }
    for (suffix, replacement) in rules {
        match strip_suffix_ci(word, suffix) {
            Some(stem) if !stem.is_empty() => return format!("{stem}{replacement}"),
            _ => {}
        }
    }
    let stem = strip_suffix_ci(word, "e").unwrap_or(word);
    format!("{stem}{default_suffix}")
}

impl SuffixTable {
    pub fn apply(&self, word: &str) -> String {
        apply_rules(
            word,
            self.rules
                .iter()
                .map(|r| (r.suffix.as_str(), r.replacement.as_str())),
            &self.default_suffix,
        )
    }
}

/// German genitive of a name: `Hans` → `Hans'`, `Anna` → `Annas`.
pub fn german_genitive(name: &str) -> String {
    if GERMAN_SIBILANT_ENDINGS
        .iter()
        .any(|ending| strip_suffix_ci(name, ending).is_some())
    {
        format!("{name}'")
    } else {
        format!("{name}s")
    }
}

/// English possessive: `Charles` → `Charles'`, `Anna` → `Anna's`.
pub fn english_possessive(name: &str) -> String {
    if strip_suffix_ci(name, "s").is_some() {
        format!("{name}'")
    } else {
        format!("{name}'s")
    }
}
