use const_fnv1a_hash::fnv1a_hash_str_64;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use super::LoadError;

/// Locale code → text. Ordered so the "first available" fallback is stable.
pub type LocalizedText = BTreeMap<String, String>;

/// Named catalogs available to one execution.
pub type Catalogs = HashMap<String, Catalog>;

/// Stable identity of a catalog item, used for distinctness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemIdentity(pub u64);

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Grammatical metadata value attached to a catalog item.
///
/// Nestable, so agreement rules can address values by dotted path
/// (`"forms.gender"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GramValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<GramValue>),
    Map(BTreeMap<String, GramValue>),
}

impl GramValue {
    /// The value as a lookup key. Lists and maps have no key form.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

/// Resolve a dotted path (`"a.b.c"`) inside a grammatical metadata map.
pub fn gram_lookup<'a>(gram: &'a BTreeMap<String, GramValue>, path: &str) -> Option<&'a GramValue> {
    let mut segments = path.split('.');
    let mut current = gram.get(segments.next()?)?;
    for segment in segments {
        match current {
            GramValue::Map(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Look up the text for `locale`, falling back to the base language
/// (`de-AT` → `de`), then English, then the first available entry.
pub fn localized<'a>(text: &'a LocalizedText, locale: &str) -> Option<&'a str> {
    if let Some(t) = text.get(locale) {
        return Some(t);
    }
    let base = base_language(locale);
    if let Some(t) = text.get(base) {
        return Some(t);
    }
    if let Some(t) = text.get("en") {
        return Some(t);
    }
    text.values().next().map(String::as_str)
}

/// The language part of a locale code: `"de-AT"` and `"de_AT"` → `"de"`.
pub fn base_language(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

fn default_weight() -> f64 {
    1.0
}

/// A candidate text fragment in a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Explicit identity. When absent, identity is derived from content.
    #[serde(default)]
    pub id: Option<String>,
    pub text: LocalizedText,
    #[serde(default)]
    pub tags: FxHashSet<String>,
    #[serde(default)]
    pub kinds: FxHashSet<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub gram: BTreeMap<String, GramValue>,
}

impl CatalogItem {
    /// An item with the same text in every locale it is later asked for.
    pub fn new(locale: &str, text: &str) -> Self {
        Self {
            id: None,
            text: BTreeMap::from([(locale.to_string(), text.to_string())]),
            tags: FxHashSet::default(),
            kinds: FxHashSet::default(),
            weight: default_weight(),
            gram: BTreeMap::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    pub fn with_kinds(mut self, kinds: &[&str]) -> Self {
        self.kinds.extend(kinds.iter().map(|k| k.to_string()));
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_gram(mut self, key: &str, value: GramValue) -> Self {
        self.gram.insert(key.to_string(), value);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn text(&self, locale: &str) -> Option<&str> {
        localized(&self.text, locale)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Weight used for selection: non-positive or non-finite weights count as 1.
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            1.0
        }
    }

    pub fn gram_value(&self, path: &str) -> Option<&GramValue> {
        gram_lookup(&self.gram, path)
    }

    /// Identity derived from the explicit id, or from the item's text, tags
    /// and kinds in canonical (sorted) order.
    pub fn identity(&self) -> ItemIdentity {
        if let Some(id) = &self.id {
            return ItemIdentity(fnv1a_hash_str_64(&format!("id:{id}")));
        }
        let mut canonical = String::from("text:");
        for (locale, text) in &self.text {
            canonical.push_str(locale);
            canonical.push('=');
            canonical.push_str(text);
            canonical.push('\u{1f}');
        }
        canonical.push_str("|tags:");
        canonical.push_str(&sorted_join(&self.tags));
        canonical.push_str("|kinds:");
        canonical.push_str(&sorted_join(&self.kinds));
        ItemIdentity(fnv1a_hash_str_64(&canonical))
    }
}

fn sorted_join(set: &FxHashSet<String>) -> String {
    let mut values: Vec<&str> = set.iter().map(String::as_str).collect();
    values.sort_unstable();
    values.join("\u{1f}")
}

/// An ordered collection of candidate items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parse a catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<Catalog, LoadError> {
        super::from_ron_str(input)
    }

    /// Load a catalog from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Catalog, LoadError> {
        super::load_ron(path)
    }
}
