//! The alias table built up during one pattern execution.

use const_fnv1a_hash::fnv1a_hash_str_64;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::schema::catalog::{CatalogItem, GramValue, ItemIdentity};

pub const GENERATED_TAG: &str = "generated";

/// Text produced by running a recipe, standing in for a catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticItem {
    pub text: String,
    pub locale: String,
    /// Recipe id the text came from.
    pub source: String,
    pub tags: FxHashSet<String>,
    pub kinds: FxHashSet<String>,
}

impl SyntheticItem {
    pub fn new(text: String, locale: &str, source: &str) -> Self {
        Self {
            text,
            locale: locale.to_string(),
            source: source.to_string(),
            tags: [GENERATED_TAG.to_string()].into_iter().collect(),
            kinds: FxHashSet::default(),
        }
    }

    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity(fnv1a_hash_str_64(&format!(
            "synthetic:{}:{}",
            self.source, self.text
        )))
    }
}

/// A bound selection: a catalog item or generated text.
#[derive(Debug, Clone)]
pub enum Part {
    Catalog(CatalogItem),
    Synthetic(SyntheticItem),
}

impl Part {
    /// Generated text is returned whatever locale is asked for.
    pub fn text(&self, locale: &str) -> Option<&str> {
        match self {
            Self::Catalog(item) => item.text(locale),
            Self::Synthetic(item) => Some(&item.text),
        }
    }

    pub fn identity(&self) -> ItemIdentity {
        match self {
            Self::Catalog(item) => item.identity(),
            Self::Synthetic(item) => item.identity(),
        }
    }

    pub fn tags(&self) -> &FxHashSet<String> {
        match self {
            Self::Catalog(item) => &item.tags,
            Self::Synthetic(item) => &item.tags,
        }
    }

    pub fn kinds(&self) -> &FxHashSet<String> {
        match self {
            Self::Catalog(item) => &item.kinds,
            Self::Synthetic(item) => &item.kinds,
        }
    }

    /// Grammatical metadata at a dotted path. Generated text carries none.
    pub fn gram_value(&self, path: &str) -> Option<&GramValue> {
        match self {
            Self::Catalog(item) => item.gram_value(path),
            Self::Synthetic(_) => None,
        }
    }
}

/// Alias → part, remembering insertion order.
#[derive(Debug, Clone, Default)]
pub struct Parts {
    entries: FxHashMap<String, Part>,
    order: Vec<String>,
}

impl Parts {
    pub fn get(&self, alias: &str) -> Option<&Part> {
        self.entries.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in the order their aliases were first bound.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Part)> {
        self.order
            .iter()
            .filter_map(|alias| self.entries.get(alias).map(|part| (alias.as_str(), part)))
    }

    /// Locale text of the part bound to `alias`.
    pub fn text(&self, alias: &str, locale: &str) -> Option<&str> {
        self.get(alias)?.text(locale)
    }

    /// Bind `alias`, replacing any earlier binding.
    pub fn insert(&mut self, alias: impl Into<String>, part: Part) {
        let alias = alias.into();
        if !self.entries.contains_key(&alias) {
            self.order.push(alias.clone());
        }
        self.entries.insert(alias, part);
    }
}
