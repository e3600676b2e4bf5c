use serde::{Deserialize, Serialize};
use std::fmt;

use super::catalog::CatalogItem;

/// A filter over catalog items. Empty lists place no constraint.
///
/// - `kinds`: item must have ANY of these kinds
/// - `tags`: item must have ALL of these tags
/// - `any_of_tags`: item must have ANY of these tags
/// - `none_of_tags`: item must have NONE of these tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub any_of_tags: Vec<String>,
    #[serde(default)]
    pub none_of_tags: Vec<String>,
    /// Set by `merge` when both sides constrain kinds and share none.
    /// No item matches such a clause.
    #[serde(skip)]
    pub kinds_conflict: bool,
}

impl WhereClause {
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.kinds_conflict
            && self.kinds.is_empty()
            && self.tags.is_empty()
            && self.any_of_tags.is_empty()
            && self.none_of_tags.is_empty()
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        !self.kinds_conflict
            && (self.kinds.is_empty() || self.kinds.iter().any(|k| item.kinds.contains(k)))
            && self.tags.iter().all(|t| item.tags.contains(t))
            && (self.any_of_tags.is_empty() || self.any_of_tags.iter().any(|t| item.tags.contains(t)))
            && !self.none_of_tags.iter().any(|t| item.tags.contains(t))
    }

    /// Combine two clauses.
    ///
    /// Tag lists concatenate. Kinds intersect when both sides constrain
    /// them, otherwise the constrained side wins. An empty intersection
    /// makes the clause unsatisfiable.
    pub fn merge(&self, other: &WhereClause) -> WhereClause {
        let kinds: Vec<String> = match (self.kinds.is_empty(), other.kinds.is_empty()) {
            (false, false) => self
                .kinds
                .iter()
                .filter(|k| other.kinds.contains(k))
                .cloned()
                .collect(),
            (false, true) => self.kinds.clone(),
            _ => other.kinds.clone(),
        };
        let kinds_conflict = self.kinds_conflict
            || other.kinds_conflict
            || (!self.kinds.is_empty() && !other.kinds.is_empty() && kinds.is_empty());
        WhereClause {
            kinds,
            kinds_conflict,
            tags: concat(&self.tags, &other.tags),
            any_of_tags: concat(&self.any_of_tags, &other.any_of_tags),
            none_of_tags: concat(&self.none_of_tags, &other.none_of_tags),
        }
    }
}

fn concat(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().chain(b).cloned().collect()
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("kinds", &self.kinds),
            ("tags", &self.tags),
            ("any_of_tags", &self.any_of_tags),
            ("none_of_tags", &self.none_of_tags),
        ];
        let mut rendered: Vec<String> = fields
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| format!("{}: [{}]", name, values.join(", ")))
            .collect();
        if self.kinds_conflict {
            rendered.insert(0, "kinds: conflicting".to_string());
        }
        write!(f, "{{{}}}", rendered.join(", "))
    }
}
