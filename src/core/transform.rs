//! Text transforms: locale-specific block transforms (demonym, genitive,
//! gender-adapted titles) and the generic post-processing pipeline.
//!
//! Transforms never fail. Unknown names and unsupported locales log a
//! warning and pass the text through unchanged.

use rustc_hash::FxHashSet;
use tracing::warn;

use crate::core::parts::Parts;
use crate::core::suffix;
use crate::schema::catalog::{base_language, GramValue};
use crate::schema::lang::{normalize_gender, LanguageRules};

pub use crate::core::suffix::{english_possessive, german_genitive};

/// Alias whose `gender` drives `genderAdapt`.
pub const PERSON_ALIAS: &str = "Person";

const GERMAN_PARTICLES: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einer", "eines", "und", "oder",
    "von", "vom", "zu", "zum", "zur", "im", "in", "an", "am", "auf", "aus", "bei", "mit", "nach",
    "über", "unter", "für", "vor",
];

const ENGLISH_PARTICLES: &[&str] = &[
    "a", "an", "the", "and", "or", "nor", "but", "of", "in", "on", "at", "to", "for", "by",
    "with", "from", "as",
];

/// Generic transforms applied over composed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostTransform {
    TrimSpaces,
    CollapseSpaces,
    TitleCase,
    ConcatNoSpace,
    NormalizeUmlauts,
}

impl PostTransform {
    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "trimspaces" => Some(Self::TrimSpaces),
            "collapsespaces" => Some(Self::CollapseSpaces),
            "titlecase" => Some(Self::TitleCase),
            "concatnospace" => Some(Self::ConcatNoSpace),
            "normalizeumlauts" => Some(Self::NormalizeUmlauts),
            _ => None,
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            Self::TrimSpaces => text.trim().to_string(),
            Self::CollapseSpaces => collapse_spaces(text),
            Self::TitleCase => title_case(text),
            Self::ConcatNoSpace => text.chars().filter(|c| !c.is_whitespace()).collect(),
            Self::NormalizeUmlauts => normalize_umlauts(text),
        }
    }
}

/// Transforms a select/generate block may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTransform {
    GenderAdapt,
    Demonym,
    Genitive,
    Post(PostTransform),
}

impl BlockTransform {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "genderadapt" => Some(Self::GenderAdapt),
            "demonym" => Some(Self::Demonym),
            "genitive" | "possessive" => Some(Self::Genitive),
            _ => PostTransform::parse(name).map(Self::Post),
        }
    }
}

/// Run the named post-transforms over `text`, in order.
pub fn apply_transforms<S: AsRef<str>>(text: &str, names: &[S]) -> String {
    let mut out = text.to_string();
    for name in names {
        let name = name.as_ref();
        match PostTransform::parse(name) {
            Some(transform) => out = transform.apply(&out),
            None => warn!(transform = name, "unknown transform; text left unchanged"),
        }
    }
    out
}

/// Apply a block-level transform to a block's text.
pub fn apply_block_transform(
    name: &str,
    text: &str,
    locale: &str,
    rules: &LanguageRules,
    parts: &Parts,
) -> String {
    match BlockTransform::parse(name) {
        Some(BlockTransform::GenderAdapt) => adapt_to_person(text, locale, rules, parts),
        Some(BlockTransform::Demonym) => demonym_with_rules(text, locale, rules),
        Some(BlockTransform::Genitive) => genitive(text, locale),
        Some(BlockTransform::Post(post)) => post.apply(text),
        None => {
            warn!(transform = name, "unknown transform; text left unchanged");
            text.to_string()
        }
    }
}

/// Inhabitant name for a place, using the built-in German/English tables.
pub fn demonym(place: &str, locale: &str) -> String {
    demonym_with_rules(place, locale, &LanguageRules::default())
}

/// Inhabitant name for a place. A demonym table in `rules` for the locale
/// replaces the built-in one.
pub fn demonym_with_rules(place: &str, locale: &str, rules: &LanguageRules) -> String {
    if let Some(table) = rules.locale(locale).and_then(|r| r.demonyms.as_ref()) {
        return keep_padding(place, |word| table.apply(word));
    }
    match suffix::builtin_demonyms(base_language(locale)) {
        Some((table, default_suffix)) => keep_padding(place, |word| {
            suffix::apply_rules(word, table.iter().copied(), default_suffix)
        }),
        None => {
            warn!(locale, "demonym transform not supported for locale");
            place.to_string()
        }
    }
}

/// Genitive/possessive form of a name for `locale`.
pub fn genitive(name: &str, locale: &str) -> String {
    match base_language(locale) {
        "de" => keep_padding(name, suffix::german_genitive),
        "en" => keep_padding(name, suffix::english_possessive),
        _ => {
            warn!(locale, "genitive transform not supported for locale");
            name.to_string()
        }
    }
}

/// Rewrite the word inside `text`, keeping its surrounding whitespace.
/// Blank text is returned unchanged.
fn keep_padding(text: &str, rewrite: impl FnOnce(&str) -> String) -> String {
    let word = text.trim();
    if word.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let end = start + word.len();
    format!("{}{}{}", &text[..start], rewrite(word), &text[end..])
}

/// Adapt a title to a gender using the locale's rule tables.
///
/// An explicit `gender_titles` entry wins; otherwise feminine titles get the
/// locale's `feminine_suffix` unless they already end with it.
pub fn gender_adapt(title: &str, gender: &str, locale: &str, rules: &LanguageRules) -> String {
    let gender = normalize_gender(gender);
    let Some(locale_rules) = rules.locale(locale) else {
        warn!(locale, "no language rules for gender adaptation");
        return title.to_string();
    };
    if let Some(form) = locale_rules.gendered_title(title, &gender) {
        return form.to_string();
    }
    match (&locale_rules.feminine_suffix, gender.as_str()) {
        (Some(suffix), "f") if !title.ends_with(suffix.as_str()) => format!("{title}{suffix}"),
        _ => title.to_string(),
    }
}

fn adapt_to_person(title: &str, locale: &str, rules: &LanguageRules, parts: &Parts) -> String {
    let Some(person) = parts.get(PERSON_ALIAS) else {
        warn!(alias = PERSON_ALIAS, "genderAdapt needs a bound person; text left unchanged");
        return title.to_string();
    };
    match person.gram_value("gender").and_then(GramValue::as_key) {
        Some(gender) => gender_adapt(title, &gender, locale, rules),
        None => {
            warn!(alias = PERSON_ALIAS, "person has no gender; text left unchanged");
            title.to_string()
        }
    }
}

/// Words kept lower-case by [`title_case_with`] unless they open the text.
#[derive(Debug, Clone)]
pub struct TitleCaseOptions {
    pub particles: FxHashSet<String>,
}

impl Default for TitleCaseOptions {
    fn default() -> Self {
        Self {
            particles: GERMAN_PARTICLES
                .iter()
                .chain(ENGLISH_PARTICLES)
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Title-case with the built-in German and English particles.
pub fn title_case(text: &str) -> String {
    title_case_with(text, &TitleCaseOptions::default())
}

/// Capitalise every word except particles; the first word is always
/// capitalised. Whitespace is preserved as-is.
pub fn title_case_with(text: &str, options: &TitleCaseOptions) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut first = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !word.is_empty() {
                out.push_str(&title_word(&word, first, options));
                first = false;
                word.clear();
            }
            out.push(c);
        } else {
            word.push(c);
        }
    }
    if !word.is_empty() {
        out.push_str(&title_word(&word, first, options));
    }
    out
}

fn title_word(word: &str, first: bool, options: &TitleCaseOptions) -> String {
    let lower = word.to_lowercase();
    if !first && options.particles.contains(&lower) {
        return lower;
    }
    word.split('-')
        .map(capitalize_segment)
        .collect::<Vec<_>>()
        .join("-")
}

/// Capitalise the first letter before any apostrophe; the rest is untouched.
fn capitalize_segment(segment: &str) -> String {
    let head_end = segment
        .find(['\'', '’'])
        .unwrap_or(segment.len());
    let (head, tail) = segment.split_at(head_end);
    let mut out = String::with_capacity(segment.len());
    let mut done = false;
    for c in head.chars() {
        if !done && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out.push_str(tail);
    out
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Replace umlauts and other Latin diacritics with ASCII spellings.
pub fn normalize_umlauts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_diacritic(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

fn fold_diacritic(c: char) -> Option<&'static str> {
    let folded = match c {
        'ä' => "ae",
        'ö' => "oe",
        'ü' => "ue",
        'Ä' => "Ae",
        'Ö' => "Oe",
        'Ü' => "Ue",
        'ß' => "ss",
        'ẞ' => "SS",
        'à' | 'á' | 'â' | 'ã' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Å' => "A",
        'æ' => "ae",
        'Æ' => "Ae",
        'ç' => "c",
        'Ç' => "C",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ñ' => "n",
        'Ñ' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => "O",
        'œ' => "oe",
        'Œ' => "Oe",
        'ù' | 'ú' | 'û' => "u",
        'Ù' | 'Ú' | 'Û' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parts::Part;
    use crate::schema::catalog::CatalogItem;
    use crate::schema::from_ron_str;

    fn rules() -> LanguageRules {
        from_ron_str(
            r#"(locales: {
                "de": (
                    gender_titles: {"Graf": {"f": "Gräfin"}, "Herzog": {"f": "Herzogin"}},
                    feminine_suffix: "in",
                ),
                "en": (gender_titles: {"Duke": {"f": "Duchess"}}),
                "fr": (demonyms: (rules: [(suffix: "is", replacement: "isien")], default_suffix: "ois")),
            })"#,
        )
        .unwrap()
    }

    #[test]
    fn title_case_particles() {
        assert_eq!(title_case("der herr von und zu"), "Der Herr von und zu");
        assert_eq!(title_case("the lord of the rings"), "The Lord of the Rings");
    }

    #[test]
    fn title_case_apostrophes_and_hyphens() {
        assert_eq!(title_case("anna's garten"), "Anna's Garten");
        assert_eq!(title_case("hans' haus"), "Hans' Haus");
        assert_eq!(title_case("baden-württemberg"), "Baden-Württemberg");
    }

    #[test]
    fn title_case_preserves_whitespace() {
        assert_eq!(title_case("  graf  von   bergen "), "  Graf  von   Bergen ");
    }

    #[test]
    fn title_case_custom_particles() {
        let options = TitleCaseOptions {
            particles: ["de".to_string(), "la".to_string()].into_iter().collect(),
        };
        assert_eq!(title_case_with("maria de la cruz", &options), "Maria de la Cruz");
        assert_eq!(title_case_with("von bergen", &options), "Von Bergen");
    }

    #[test]
    fn post_transform_pipeline() {
        let text = "  graf   von bergen ";
        assert_eq!(
            apply_transforms(text, &["CollapseSpaces", "trimspaces", "TitleCase"]),
            "Graf von Bergen"
        );
        assert_eq!(apply_transforms("a b  c", &["ConcatNoSpace"]), "abc");
        assert_eq!(apply_transforms("Müller Straße", &["NormalizeUmlauts"]), "Mueller Strasse");
        assert_eq!(apply_transforms("Ångström café", &["NormalizeUmlauts"]), "Angstroem cafe");
    }

    #[test]
    fn unknown_post_transform_passes_through() {
        assert_eq!(apply_transforms("Text", &["Shout", "TrimSpaces"]), "Text");
    }

    #[test]
    fn block_transform_names_are_case_insensitive() {
        assert_eq!(BlockTransform::parse("GenderAdapt"), Some(BlockTransform::GenderAdapt));
        assert_eq!(BlockTransform::parse("DEMONYM"), Some(BlockTransform::Demonym));
        assert_eq!(BlockTransform::parse("possessive"), Some(BlockTransform::Genitive));
        assert_eq!(
            BlockTransform::parse("titleCase"),
            Some(BlockTransform::Post(PostTransform::TitleCase))
        );
        assert_eq!(BlockTransform::parse("reverse"), None);
    }

    #[test]
    fn demonym_samples() {
        assert_eq!(demonym("Hamburg", "de"), "Hamburger");
        assert_eq!(demonym("Iceland", "en"), "Icelander");
        assert_eq!(demonym("Iceland", "en-GB"), "Icelander");
    }

    #[test]
    fn demonym_unsupported_locale_passes_through() {
        assert_eq!(demonym("Roma", "it"), "Roma");
    }

    #[test]
    fn demonym_rule_override() {
        let rules = rules();
        assert_eq!(demonym_with_rules("Paris", "fr", &rules), "Parisien");
        assert_eq!(demonym_with_rules("Lille", "fr", &rules), "Lillois");
        assert_eq!(demonym_with_rules("Hamburg", "de", &rules), "Hamburger");
    }

    #[test]
    fn genitive_samples() {
        assert_eq!(genitive("Hans", "de"), "Hans'");
        assert_eq!(genitive("Anna", "de"), "Annas");
        assert_eq!(genitive("Charles", "en"), "Charles'");
        assert_eq!(genitive("Anna", "en"), "Anna's");
        assert_eq!(genitive("Anna", "pl"), "Anna");
    }

    #[test]
    fn surrounding_whitespace_survives() {
        assert_eq!(demonym(" Hamburg ", "de"), " Hamburger ");
        assert_eq!(demonym("\tIceland", "en"), "\tIcelander");
        assert_eq!(genitive("Otto  ", "de"), "Ottos  ");
        assert_eq!(genitive(" Charles", "en"), " Charles'");
        assert_eq!(demonym("   ", "de"), "   ");
    }

    #[test]
    fn gender_adapt_tables_and_suffix() {
        let rules = rules();
        assert_eq!(gender_adapt("Graf", "f", "de", &rules), "Gräfin");
        assert_eq!(gender_adapt("König", "female", "de", &rules), "Königin");
        assert_eq!(gender_adapt("Königin", "f", "de", &rules), "Königin");
        assert_eq!(gender_adapt("Graf", "m", "de", &rules), "Graf");
        assert_eq!(gender_adapt("Duke", "f", "en", &rules), "Duchess");
        assert_eq!(gender_adapt("Lord", "f", "en", &rules), "Lord");
        assert_eq!(gender_adapt("Graf", "f", "pl", &rules), "Graf");
    }

    #[test]
    fn gender_adapt_reads_person_alias() {
        let rules = rules();
        let mut parts = Parts::default();
        assert_eq!(apply_block_transform("genderAdapt", "Graf", "de", &rules, &parts), "Graf");

        parts.insert(
            PERSON_ALIAS,
            Part::Catalog(CatalogItem::new("de", "Anna")),
        );
        assert_eq!(apply_block_transform("genderAdapt", "Graf", "de", &rules, &parts), "Graf");

        parts.insert(
            PERSON_ALIAS,
            Part::Catalog(
                CatalogItem::new("de", "Anna").with_gram("gender", GramValue::String("f".into())),
            ),
        );
        assert_eq!(apply_block_transform("genderAdapt", "Graf", "de", &rules, &parts), "Gräfin");
    }
}
